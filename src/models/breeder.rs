use crate::models::{
    Chromosome, Crossover, LayoutMismatch, Mutagen, Population, SelectionError, Selector,
    SerialCounter, SerialIdsExhausted,
};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum BreedError {
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),
    #[error("Crossover error: {0}")]
    Crossover(#[from] LayoutMismatch),
    #[error("Serial id error: {0}")]
    SerialIds(#[from] SerialIdsExhausted),
    #[error("GenerationOverflow: generation {0} has no successor")]
    GenerationOverflow(u32),
}

/// Produces the next generation from a fully scored one.
///
/// The elite is carried over unchanged, so the best lap time seen so far can
/// never get worse from one generation to the next. Every other slot is a child
/// of the elite and a random partner, blended and then mutated.
#[derive(Debug, Clone)]
pub struct Breeder {
    selector: Selector,
    crossover: Crossover,
    mutagen: Mutagen,
}

impl Breeder {
    pub fn new(selector: Selector, crossover: Crossover, mutagen: Mutagen) -> Self {
        Self {
            selector,
            crossover,
            mutagen,
        }
    }

    fn breed_child(
        &self,
        parent1: &Chromosome,
        parent2: &Chromosome,
        counter: &mut SerialCounter,
        rng: &mut impl rand::Rng,
    ) -> Result<Chromosome, BreedError> {
        let generation = Crossover::child_generation(parent1, parent2).ok_or(
            BreedError::GenerationOverflow(parent1.generation().max(parent2.generation())),
        )?;
        let gains = self
            .crossover
            .apply(rng, parent1.gains(), parent2.gains())?;
        let mut child = Chromosome::new(generation, gains, counter)?;

        self.mutagen.mutate(rng, &mut child);

        Ok(child)
    }

    /// Checks that `population` has a successor: at least two chromosomes, no
    /// generation number at `u32::MAX`, and enough serial ids left in
    /// `counter` for every child. Returns the successor's generation number.
    pub fn check_successor(
        &self,
        population: &Population,
        counter: &SerialCounter,
    ) -> Result<u32, BreedError> {
        let size = population.size();
        if size < 2 {
            return Err(SelectionError::TooFewCandidates { provided: size }.into());
        }

        let generation = population.generation();
        let next = generation
            .checked_add(1)
            .ok_or(BreedError::GenerationOverflow(generation))?;

        if let Some(newest) = population
            .chromosomes()
            .iter()
            .map(Chromosome::generation)
            .max()
            .filter(|newest| *newest == u32::MAX)
        {
            return Err(BreedError::GenerationOverflow(newest));
        }

        if !counter.has_room_for(size as u64 - 1) {
            return Err(SerialIdsExhausted.into());
        }

        Ok(next)
    }

    /// Breeds the successor of `population`.
    ///
    /// Fails without consuming randomness when the population has fewer than two
    /// chromosomes, any chromosome is unscored, or the successor would overflow
    /// a generation number or the serial ids.
    #[instrument(level = "info", skip(self, population, counter, rng), fields(generation = population.generation(), size = population.size()))]
    pub fn advance(
        &self,
        population: &Population,
        counter: &mut SerialCounter,
        rng: &mut impl rand::Rng,
    ) -> Result<Population, BreedError> {
        let ranking = self.selector.rank(population.chromosomes())?;
        let generation = self.check_successor(population, counter)?;
        let elite = ranking.elite();

        tracing::debug!(
            serial_id = elite.serial_id(),
            fitness = ?elite.fitness(),
            "Carrying elite forward"
        );

        let mut chromosomes = Vec::with_capacity(population.size());
        chromosomes.push(elite.clone());

        let pairs = self
            .selector
            .select_parents(population.size() - 1, &ranking, rng);
        for (parent1, parent2) in pairs {
            chromosomes.push(self.breed_child(parent1, parent2, counter, rng)?);
        }

        Ok(Population::from_chromosomes(generation, chromosomes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gains, MutationRate};
    use rand::{SeedableRng, rngs::StdRng};

    fn breeder(mutation_rate: f64) -> Breeder {
        Breeder::new(
            Selector::elitist(),
            Crossover::blend(),
            Mutagen::new(MutationRate::new(mutation_rate).expect("mutation_rate is in range")),
        )
    }

    fn scored_population(
        counter: &mut SerialCounter,
        entries: &[(Gains, u32, f64)],
    ) -> Population {
        let chromosomes = entries
            .iter()
            .map(|(gains, generation, fitness)| {
                let mut c = Chromosome::new(*generation, gains.clone(), counter).unwrap();
                c.set_fitness(*fitness);
                c
            })
            .collect();
        Population::from_chromosomes(4, chromosomes)
    }

    #[test]
    fn it_keeps_the_elite_and_population_size() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counter = SerialCounter::new();
        let population = scored_population(
            &mut counter,
            &[
                (Gains::pd(0.1, 0.2), 1, 12.1),
                (Gains::pd(0.3, 0.4), 2, 11.5),
                (Gains::pd(0.5, 0.6), 1, 13.0),
            ],
        );

        let next = breeder(0.35)
            .advance(&population, &mut counter, &mut rng)
            .unwrap();

        assert_eq!(next.size(), 3);
        assert_eq!(next.generation(), 5);

        let elite = &next.chromosomes()[0];
        assert_eq!(elite.gains(), &Gains::pd(0.3, 0.4));
        assert_eq!(elite.generation(), 2);
        assert_eq!(elite.fitness(), Some(11.5));
    }

    #[test]
    fn it_breeds_children_one_generation_past_their_newest_parent() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut counter = SerialCounter::new();
        let population = scored_population(
            &mut counter,
            &[
                (Gains::pd(0.1, 0.2), 3, 1.0),
                (Gains::pd(0.3, 0.4), 7, 2.0),
                (Gains::pd(0.5, 0.6), 7, 3.0),
            ],
        );

        let next = breeder(0.0)
            .advance(&population, &mut counter, &mut rng)
            .unwrap();

        for child in &next.chromosomes()[1..] {
            assert_eq!(child.generation(), 8);
            assert_eq!(child.fitness(), None);
            assert!(child.serial_id() > 3);
        }
    }

    #[test]
    fn it_blends_children_between_elite_and_partner_without_mutation() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut counter = SerialCounter::new();
        let population = scored_population(
            &mut counter,
            &[(Gains::pd(0.2, 0.2), 1, 1.0), (Gains::pd(0.8, 0.6), 1, 2.0)],
        );

        let next = breeder(0.0)
            .advance(&population, &mut counter, &mut rng)
            .unwrap();

        let child = next.chromosomes()[1].gains();
        assert!((0.2..=0.8).contains(&child.kp));
        assert!((0.2..=0.6).contains(&child.kd));
    }

    #[test]
    fn it_keeps_genes_in_range_under_full_mutation() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut counter = SerialCounter::new();
        let mut population = scored_population(
            &mut counter,
            &[
                (Gains::pid(0.0, 0.0, 0.0), 1, 1.0),
                (Gains::pid(1.0, 1.0, 1.0), 1, 2.0),
                (Gains::pid(0.5, 0.5, 0.5), 1, 3.0),
            ],
        );

        for round in 0..20 {
            let mut next = breeder(1.0)
                .advance(&population, &mut counter, &mut rng)
                .unwrap();
            for (i, c) in next.chromosomes_mut().iter_mut().enumerate() {
                assert!(c.gains().values().iter().all(|g| (0.0..=1.0).contains(g)));
                c.set_fitness((round + i) as f64);
            }
            population = next;
        }
    }

    #[test]
    fn it_fails_fast_on_unscored_population() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut counter = SerialCounter::new();
        let chromosomes = vec![
            Chromosome::new(1, Gains::pd(0.1, 0.1), &mut counter).unwrap(),
            Chromosome::new(1, Gains::pd(0.2, 0.2), &mut counter).unwrap(),
        ];
        let population = Population::from_chromosomes(1, chromosomes);

        let result = breeder(0.5).advance(&population, &mut counter, &mut rng);
        assert!(matches!(
            result,
            Err(BreedError::Selection(SelectionError::Unscored { .. }))
        ));
    }

    #[test]
    fn it_fails_fast_on_tiny_population() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut counter = SerialCounter::new();
        let population = scored_population(&mut counter, &[(Gains::pd(0.1, 0.1), 1, 1.0)]);

        let result = breeder(0.5).advance(&population, &mut counter, &mut rng);
        assert!(matches!(
            result,
            Err(BreedError::Selection(SelectionError::TooFewCandidates {
                provided: 1
            }))
        ));
    }

    #[test]
    fn it_rejects_mixed_gain_layouts() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut counter = SerialCounter::new();
        let population = scored_population(
            &mut counter,
            &[(Gains::pd(0.1, 0.1), 1, 1.0), (Gains::pid(0.2, 0.2, 0.2), 1, 2.0)],
        );

        let result = breeder(0.5).advance(&population, &mut counter, &mut rng);
        assert!(matches!(result, Err(BreedError::Crossover(_))));
    }

    #[test]
    fn it_refuses_to_overflow_generation_numbers() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut counter = SerialCounter::new();
        let population = scored_population(
            &mut counter,
            &[(Gains::pd(0.1, 0.1), 1, 1.0), (Gains::pd(0.2, 0.2), u32::MAX, 2.0)],
        );

        let result = breeder(0.5).advance(&population, &mut counter, &mut rng);
        assert!(matches!(
            result,
            Err(BreedError::GenerationOverflow(u32::MAX))
        ));

        let chromosomes = population.chromosomes().to_vec();
        let last = Population::from_chromosomes(u32::MAX, chromosomes);
        let result = breeder(0.5).advance(&last, &mut counter, &mut rng);
        assert!(matches!(
            result,
            Err(BreedError::GenerationOverflow(u32::MAX))
        ));
    }

    #[test]
    fn it_refuses_to_run_out_of_serial_ids_mid_generation() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut counter = SerialCounter::new();
        let population = scored_population(
            &mut counter,
            &[
                (Gains::pd(0.1, 0.1), 1, 1.0),
                (Gains::pd(0.2, 0.2), 1, 2.0),
                (Gains::pd(0.3, 0.3), 1, 3.0),
            ],
        );

        // Room for one child but the generation needs two
        let mut counter = SerialCounter::after(u64::MAX - 1);
        let result = breeder(0.5).advance(&population, &mut counter, &mut rng);

        assert!(matches!(result, Err(BreedError::SerialIds(_))));
        assert_eq!(counter.peek(), Some(u64::MAX));
    }
}
