use crate::models::{BreedError, GeneKind, PopulationError, ReportError};
use crate::repositories::{best, snapshots};

/// Errors that can occur during a tuning session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("SnapshotError: {0}")]
    SnapshotError(#[from] snapshots::Error),
    #[error("BestLogError: {0}")]
    BestLogError(#[from] best::Error),
    #[error("BreedError: {0}")]
    BreedError(#[from] BreedError),
    #[error("PopulationError: {0}")]
    PopulationError(#[from] PopulationError),
    #[error("ReportError: {0}")]
    ReportError(#[from] ReportError),
    #[error("NonFiniteFitness: serial_id={serial_id}, value={value}")]
    NonFiniteFitness { serial_id: u64, value: f64 },
    #[error("NonFiniteGain: serial_id={serial_id}, gene={kind}, value={value}")]
    NonFiniteGain {
        serial_id: u64,
        kind: GeneKind,
        value: f64,
    },
    #[error("UnscoredPopulation: generation={0}")]
    UnscoredPopulation(u32),
}
