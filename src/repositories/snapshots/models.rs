use super::Error;
use crate::models::{Chromosome, Population};
use crate::repositories::records::ChromosomeRecord;
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub(super) const SCHEMA_VERSION: u32 = 1;

fn default_version() -> u32 {
    SCHEMA_VERSION
}

fn default_generation() -> u32 {
    1
}

/// A whole population as written to a snapshot file.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotRecord {
    // Records written before versioning carry no version and are read as v1
    #[serde(default = "default_version")]
    pub version: u32,
    pub chromosomes: Vec<ChromosomeRecord>,
    #[serde(default = "default_generation")]
    pub generation: u32,
}

impl SnapshotRecord {
    pub(super) fn new(population: &Population, generation: u32) -> Self {
        Self {
            version: SCHEMA_VERSION,
            chromosomes: population
                .chromosomes()
                .iter()
                .map(ChromosomeRecord::from)
                .collect(),
            generation,
        }
    }
}

impl TryFrom<SnapshotRecord> for Population {
    type Error = Error;

    #[instrument(level = "debug", skip(record), fields(version = record.version, generation = record.generation, chromosomes = record.chromosomes.len()))]
    fn try_from(record: SnapshotRecord) -> Result<Self, Self::Error> {
        if record.version != SCHEMA_VERSION {
            return Err(Error::UnsupportedVersion(record.version));
        }

        let chromosomes: Vec<Chromosome> = record
            .chromosomes
            .into_iter()
            .map(Chromosome::from)
            .collect();

        let first = chromosomes.first().ok_or(Error::Empty)?;
        let morphology = first.gains().morphology();
        if let Some(odd) = chromosomes
            .iter()
            .find(|c| c.gains().morphology() != morphology)
        {
            return Err(Error::MixedLayouts {
                serial_id: odd.serial_id(),
            });
        }

        Ok(Population::from_chromosomes(record.generation, chromosomes))
    }
}
