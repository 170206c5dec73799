use std::path::PathBuf;

/// Errors that can occur in snapshot repository operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("NotFound: no snapshot at {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("UnsupportedVersion: version={0}")]
    UnsupportedVersion(u32),
    #[error("Empty: snapshot holds no chromosomes")]
    Empty,
    #[error("MixedLayouts: chromosome {serial_id} does not match the gain layout of the first")]
    MixedLayouts { serial_id: u64 },
}
