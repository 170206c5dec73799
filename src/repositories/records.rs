use crate::models::{Chromosome, Gains};
use serde::{Deserialize, Deserializer, Serialize};

/// Persisted form of a chromosome, shared by snapshots and the best log.
///
/// `lap_time` may be null but must be present; `ki` is present only for PID
/// gains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromosomeRecord {
    #[serde(rename = "gen")]
    pub generation: u32,
    pub number: u64,
    pub kp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ki: Option<f64>,
    pub kd: f64,
    #[serde(deserialize_with = "required_nullable")]
    pub lap_time: Option<f64>,
}

// A custom deserializer turns a missing field into an error instead of None.
fn required_nullable<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)
}

impl From<&Chromosome> for ChromosomeRecord {
    fn from(chromosome: &Chromosome) -> Self {
        let gains = chromosome.gains();
        Self {
            generation: chromosome.generation(),
            number: chromosome.serial_id(),
            kp: gains.kp,
            ki: gains.ki,
            kd: gains.kd,
            lap_time: chromosome.fitness(),
        }
    }
}

impl From<ChromosomeRecord> for Chromosome {
    fn from(record: ChromosomeRecord) -> Self {
        Chromosome::restore(
            record.generation,
            record.number,
            Gains {
                kp: record.kp,
                ki: record.ki,
                kd: record.kd,
            },
            record.lap_time,
        )
    }
}
