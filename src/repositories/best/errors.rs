/// Errors that can occur in best-log repository operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("MalformedLine: line {line}: {source}")]
    MalformedLine {
        line: usize,
        source: serde_json::Error,
    },
}
