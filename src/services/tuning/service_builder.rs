use super::Service;
use crate::config::SerialPolicy;
use crate::models::{Breeder, Crossover, Distribution, Morphology, Mutagen, MutationRate, Selector};
use crate::repositories::best;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::instrument;

pub struct ServiceBuilder {
    pub(super) best: best::Repository,
    pub(super) initial: Distribution,
    pub(super) morphology: Morphology,
    pub(super) population_size: usize,
    pub(super) generations: u32,
    pub(super) mutation_rate: MutationRate,
    pub(super) serial_policy: SerialPolicy,
    pub(super) seed: Option<u64>,
}

impl ServiceBuilder {
    pub(super) fn new(best: best::Repository) -> Self {
        Self {
            best,
            initial: Distribution::default(),
            morphology: Morphology::default(),
            population_size: 5,
            generations: 12,
            mutation_rate: MutationRate::default(),
            serial_policy: SerialPolicy::default(),
            seed: None,
        }
    }

    pub fn with_initial(mut self, initial: Distribution) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_morphology(mut self, morphology: Morphology) -> Self {
        self.morphology = morphology;
        self
    }

    pub fn with_population_size(mut self, population_size: usize) -> Self {
        self.population_size = population_size;
        self
    }

    pub fn with_generations(mut self, generations: u32) -> Self {
        self.generations = generations;
        self
    }

    pub fn with_mutation_rate(mut self, mutation_rate: MutationRate) -> Self {
        self.mutation_rate = mutation_rate;
        self
    }

    pub fn with_serial_policy(mut self, serial_policy: SerialPolicy) -> Self {
        self.serial_policy = serial_policy;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[instrument(level = "debug", skip(self), fields(population_size = self.population_size, generations = self.generations, seed = ?self.seed))]
    pub fn build(self) -> Service {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Service {
            breeder: Breeder::new(
                Selector::elitist(),
                Crossover::blend(),
                Mutagen::new(self.mutation_rate),
            ),
            best: self.best,
            initial: self.initial,
            morphology: self.morphology,
            population_size: self.population_size,
            generations: self.generations,
            serial_policy: self.serial_policy,
            rng,
        }
    }
}
