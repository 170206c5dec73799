use crate::models::Chromosome;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

// ============================================================
// MutationRate
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct MutationRate(f64);

#[derive(Debug, thiserror::Error)]
#[error("mutation_rate must be between 0.0 and 1.0, got: {0}")]
pub struct MutationRateOutOfRange(f64);

impl MutationRate {
    pub fn new(value: f64) -> Result<Self, MutationRateOutOfRange> {
        if !(0.0..=1.0).contains(&value) {
            return Err(MutationRateOutOfRange(value));
        }

        Ok(Self(value))
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

impl Default for MutationRate {
    fn default() -> Self {
        Self(0.35)
    }
}

impl TryFrom<f64> for MutationRate {
    type Error = MutationRateOutOfRange;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MutationRate> for f64 {
    fn from(rate: MutationRate) -> Self {
        rate.0
    }
}

// ============================================================
// Mutagen
// ============================================================
#[derive(Debug, Clone)]
pub struct Mutagen {
    mutation_rate: MutationRate,
}

impl Mutagen {
    pub fn new(mutation_rate: MutationRate) -> Self {
        Self { mutation_rate }
    }

    /// Perturbs each gene independently with probability `mutation_rate`,
    /// then clamps the gene back into [0, 1].
    #[instrument(level = "debug", skip(self, rng, chromosome), fields(serial_id = chromosome.serial_id(), mutation_rate = self.mutation_rate.get()))]
    pub fn mutate<R: Rng>(&self, rng: &mut R, chromosome: &mut Chromosome) {
        let rate = self.mutation_rate.get();

        for (kind, gene) in chromosome.gains_mut().genes_mut() {
            if rng.random_range(0.0..1.0) < rate {
                let range = kind.mutation_range();
                let step = rng.random_range(-range..=range);
                *gene = (*gene + step).clamp(0.0, 1.0);
            }
        }
    }
}
