use super::{
    Chromosome, Distribution, DistributionError, Morphology, SerialCounter, SerialIdsExhausted,
};
use rand::Rng;
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum PopulationError {
    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),
    #[error("Serial id error: {0}")]
    SerialIds(#[from] SerialIdsExhausted),
}

/// One generation's worth of candidates.
/// The population is replaced wholesale when the next generation is bred.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Population {
    pub(crate) generation: u32,
    pub(crate) chromosomes: Vec<Chromosome>,
}

impl Population {
    /// Creates generation 1 with `size` chromosomes drawn from `distribution`.
    #[instrument(level = "debug", skip(rng, counter, distribution), fields(size = size, morphology = ?morphology))]
    pub fn random<R: Rng>(
        rng: &mut R,
        counter: &mut SerialCounter,
        distribution: &Distribution,
        morphology: Morphology,
        size: usize,
    ) -> Result<Self, PopulationError> {
        let chromosomes = distribution
            .distribute(rng, morphology, size)?
            .into_iter()
            .map(|gains| Chromosome::new(1, gains, counter))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            generation: 1,
            chromosomes,
        })
    }

    pub fn from_chromosomes(generation: u32, chromosomes: Vec<Chromosome>) -> Self {
        Self {
            generation,
            chromosomes,
        }
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn size(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    pub fn chromosomes_mut(&mut self) -> &mut [Chromosome] {
        &mut self.chromosomes
    }

    pub fn is_fully_scored(&self) -> bool {
        self.chromosomes.iter().all(Chromosome::is_scored)
    }

    /// The scored chromosome with the lowest lap time; the first one wins ties.
    pub fn best(&self) -> Option<&Chromosome> {
        self.chromosomes
            .iter()
            .filter_map(|c| c.fitness().map(|f| (c, f)))
            .fold(None, |best: Option<(&Chromosome, f64)>, (c, f)| match best {
                Some((_, best_f)) if best_f <= f => best,
                _ => Some((c, f)),
            })
            .map(|(c, _)| c)
    }

    pub fn max_serial_id(&self) -> Option<u64> {
        self.chromosomes.iter().map(Chromosome::serial_id).max()
    }
}
