use super::{Error, SnapshotRecord};
use crate::models::Population;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Overwritable snapshot of a full population, used to resume a run.
#[derive(Debug, Clone)]
pub struct Repository {
    path: PathBuf,
}

impl Repository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the snapshot with `population` tagged as `generation`.
    #[instrument(level = "debug", skip(self, population), fields(path = %self.path.display(), size = population.size(), generation = generation))]
    pub fn save(&self, population: &Population, generation: u32) -> Result<(), Error> {
        let record = SnapshotRecord::new(population, generation);
        let json = serde_json::to_vec(&record)?;
        fs::write(&self.path, json)?;

        tracing::info!(path = %self.path.display(), generation, "Snapshot saved");
        Ok(())
    }

    /// Reads the snapshot back. The returned population carries the persisted
    /// generation number.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Population, Error> {
        let bytes = fs::read(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::NotFound(self.path.clone()),
            _ => Error::Io(e),
        })?;

        let record: SnapshotRecord = serde_json::from_slice(&bytes)?;
        let population = Population::try_from(record)?;

        tracing::info!(
            path = %self.path.display(),
            generation = population.generation(),
            size = population.size(),
            "Snapshot loaded"
        );
        Ok(population)
    }
}
