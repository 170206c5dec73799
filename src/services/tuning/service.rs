use super::{Error, ServiceBuilder};
use crate::config::SerialPolicy;
use crate::models::{
    Breeder, Chromosome, Distribution, FitnessReporter, Morphology, Operator, Population,
    SerialCounter,
};
use crate::repositories::{best, snapshots};
use rand::rngs::StdRng;
use tracing::instrument;

/// The population under evaluation together with the id sequence it draws from.
#[derive(Debug, Clone)]
pub struct Session {
    pub population: Population,
    pub counter: SerialCounter,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub generations_scored: u32,
    /// Lowest lap time recorded across every scored generation.
    pub best: Option<Chromosome>,
    pub final_population: Population,
}

// tuning service
pub struct Service {
    pub(super) breeder: Breeder,
    pub(super) best: best::Repository,
    pub(super) initial: Distribution,
    pub(super) morphology: Morphology,
    pub(super) population_size: usize,
    pub(super) generations: u32,
    pub(super) serial_policy: SerialPolicy,
    pub(super) rng: StdRng,
}

impl Service {
    pub fn builder(best: best::Repository) -> ServiceBuilder {
        ServiceBuilder::new(best)
    }

    pub fn generations(&self) -> u32 {
        self.generations
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }

    pub fn best_log(&self) -> &best::Repository {
        &self.best
    }

    /// A fresh generation-1 session drawn from the initial distribution.
    #[instrument(level = "info", skip(self), fields(size = self.population_size, morphology = ?self.morphology))]
    pub fn start(&mut self) -> Result<Session, Error> {
        let mut counter = SerialCounter::new();
        let population = Population::random(
            &mut self.rng,
            &mut counter,
            &self.initial,
            self.morphology,
            self.population_size,
        )?;

        tracing::info!(size = population.size(), "Initial population created");
        Ok(Session {
            population,
            counter,
        })
    }

    /// Picks up a run from a snapshot. The snapshot's size and layout win over
    /// the configured ones.
    ///
    /// Fails straight away when the snapshot could not be bred into its
    /// successor, unless it already is the last generation.
    #[instrument(level = "info", skip(self, snapshots), fields(path = %snapshots.path().display(), serial_policy = ?self.serial_policy))]
    pub fn resume(&self, snapshots: &snapshots::Repository) -> Result<Session, Error> {
        let population = snapshots.load()?;

        if population.size() != self.population_size {
            tracing::warn!(
                configured = self.population_size,
                snapshot = population.size(),
                "Snapshot size differs from configuration, keeping the snapshot's"
            );
        }

        if let Some(first) = population.chromosomes().first() {
            let morphology = first.gains().morphology();
            if morphology != self.morphology {
                tracing::warn!(
                    configured = ?self.morphology,
                    snapshot = ?morphology,
                    "Snapshot layout differs from configuration, keeping the snapshot's"
                );
            }
        }

        if population.generation() > self.generations {
            tracing::warn!(
                generation = population.generation(),
                generations = self.generations,
                "Snapshot is already past the last generation"
            );
        }

        let counter = match self.serial_policy {
            SerialPolicy::Continue => SerialCounter::after(population.max_serial_id().unwrap_or(0)),
            SerialPolicy::Reset => SerialCounter::new(),
        };

        // Anything that would stop breeding is reported before the operator
        // scores a single chromosome. The last generation is never bred.
        if population.generation() < self.generations {
            self.breeder.check_successor(&population, &counter)?;
        }

        Ok(Session {
            population,
            counter,
        })
    }

    /// Replaces every gene with a value supplied by the operator.
    #[instrument(level = "debug", skip(self, population, operator), fields(generation = population.generation()))]
    pub fn customize(
        &self,
        population: &mut Population,
        operator: &mut impl Operator,
    ) -> Result<(), Error> {
        for chromosome in population.chromosomes_mut() {
            let kinds: Vec<_> = chromosome
                .gains()
                .genes()
                .into_iter()
                .map(|(kind, _)| kind)
                .collect();

            for kind in kinds {
                let value = operator.gain(chromosome, kind)?;
                if !value.is_finite() {
                    return Err(Error::NonFiniteGain {
                        serial_id: chromosome.serial_id(),
                        kind,
                        value,
                    });
                }
                chromosome.gains_mut().set(kind, value);
            }
        }

        Ok(())
    }

    /// Collects a lap time for every chromosome, one at a time and in order.
    /// Previously stored lap times are overwritten.
    #[instrument(level = "info", skip(self, population, reporter), fields(generation = population.generation(), size = population.size()))]
    pub fn score(
        &self,
        population: &mut Population,
        reporter: &mut impl FitnessReporter,
    ) -> Result<(), Error> {
        for chromosome in population.chromosomes_mut() {
            let lap_time = reporter.report(chromosome)?;
            if !lap_time.is_finite() {
                return Err(Error::NonFiniteFitness {
                    serial_id: chromosome.serial_id(),
                    value: lap_time,
                });
            }

            chromosome.set_fitness(lap_time);
            tracing::debug!(serial_id = chromosome.serial_id(), lap_time, "Chromosome scored");
        }

        Ok(())
    }

    /// Appends the generation's best chromosome to the best log and returns it.
    #[instrument(level = "debug", skip(self, population), fields(generation = population.generation()))]
    pub fn record_best(&self, population: &Population) -> Result<Chromosome, Error> {
        let elite = population
            .best()
            .cloned()
            .ok_or(Error::UnscoredPopulation(population.generation()))?;

        self.best.append(&elite)?;
        Ok(elite)
    }

    /// Replaces the session's population with its bred successor.
    pub fn advance(&mut self, session: &mut Session) -> Result<(), Error> {
        let next = self
            .breeder
            .advance(&session.population, &mut session.counter, &mut self.rng)?;
        session.population = next;
        Ok(())
    }

    /// Scores, records and breeds generations until the last configured one
    /// has been scored.
    #[instrument(level = "info", skip(self, session, operator), fields(generation = session.population.generation(), generations = self.generations))]
    pub fn evolve(
        &mut self,
        mut session: Session,
        operator: &mut impl Operator,
    ) -> Result<RunSummary, Error> {
        let mut generations_scored = 0;
        let mut overall_best: Option<Chromosome> = None;

        while session.population.generation() <= self.generations {
            let generation = session.population.generation();

            operator.show(&format!("Generation {generation}"))?;
            for chromosome in session.population.chromosomes() {
                operator.show(&chromosome.to_string())?;
            }

            self.score(&mut session.population, operator)?;
            generations_scored += 1;

            if operator.confirm("Do you want to save this generation to a file?")? {
                let path = operator.path("Enter the filename to save")?;
                snapshots::Repository::new(path).save(&session.population, generation)?;
            }

            let elite = self.record_best(&session.population)?;
            operator.show(&format!("Best of generation {generation}: {elite}"))?;
            tracing::info!(
                generation,
                serial_id = elite.serial_id(),
                lap_time = ?elite.fitness(),
                "Generation complete"
            );

            if overall_best
                .as_ref()
                .is_none_or(|best| elite.fitness() < best.fitness())
            {
                overall_best = Some(elite);
            }

            if generation == self.generations {
                break;
            }
            self.advance(&mut session)?;
        }

        Ok(RunSummary {
            generations_scored,
            best: overall_best,
            final_population: session.population,
        })
    }

    /// Runs a complete interactive session: optional resume, optional custom
    /// gains, then evolution through the last generation.
    pub fn run(&mut self, operator: &mut impl Operator) -> Result<RunSummary, Error> {
        let mut session = if operator.confirm("Do you want to load a population from a file?")? {
            let path = operator.path("Enter the filename to load")?;
            self.resume(&snapshots::Repository::new(path))?
        } else {
            self.start()?
        };

        if operator.confirm("Do you want to input custom values for the chromosomes?")? {
            self.customize(&mut session.population, operator)?;
        }

        let summary = self.evolve(session, operator)?;
        operator.show("Evolution complete.")?;

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BreedError, Gains, GeneKind, ReportError, SelectionError};
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Answers every prompt from queues; an exhausted queue closes the session.
    #[derive(Default)]
    struct Scripted {
        lap_times: VecDeque<f64>,
        answers: VecDeque<bool>,
        paths: VecDeque<String>,
        gains: VecDeque<f64>,
        shown: Vec<String>,
    }

    impl FitnessReporter for Scripted {
        fn report(&mut self, _: &Chromosome) -> Result<f64, ReportError> {
            self.lap_times.pop_front().ok_or(ReportError::Closed)
        }
    }

    impl Operator for Scripted {
        fn confirm(&mut self, _: &str) -> Result<bool, ReportError> {
            Ok(self.answers.pop_front().unwrap_or(false))
        }

        fn path(&mut self, _: &str) -> Result<String, ReportError> {
            self.paths.pop_front().ok_or(ReportError::Closed)
        }

        fn gain(&mut self, _: &Chromosome, _: GeneKind) -> Result<f64, ReportError> {
            self.gains.pop_front().ok_or(ReportError::Closed)
        }

        fn show(&mut self, line: &str) -> Result<(), ReportError> {
            self.shown.push(line.to_string());
            Ok(())
        }
    }

    fn test_service(dir: &TempDir, size: usize, generations: u32) -> Service {
        Service::builder(best::Repository::new(dir.path().join("best.jsonl")))
            .with_population_size(size)
            .with_generations(generations)
            .with_seed(Some(7))
            .build()
    }

    #[test]
    fn it_scores_in_order() {
        let dir = TempDir::new().unwrap();
        let mut service = test_service(&dir, 3, 1);
        let mut session = service.start().unwrap();
        let mut operator = Scripted {
            lap_times: [12.1, 11.5, 13.0].into(),
            ..Default::default()
        };

        service.score(&mut session.population, &mut operator).unwrap();

        let fitness: Vec<_> = session
            .population
            .chromosomes()
            .iter()
            .map(Chromosome::fitness)
            .collect();
        assert_eq!(fitness, vec![Some(12.1), Some(11.5), Some(13.0)]);
        assert_eq!(session.population.best().unwrap().serial_id(), 2);
    }

    #[test]
    fn it_rejects_non_finite_lap_times() {
        let dir = TempDir::new().unwrap();
        let mut service = test_service(&dir, 2, 1);
        let mut session = service.start().unwrap();
        let mut operator = Scripted {
            lap_times: [10.0, f64::INFINITY].into(),
            ..Default::default()
        };

        let result = service.score(&mut session.population, &mut operator);

        assert!(matches!(
            result,
            Err(Error::NonFiniteFitness { serial_id: 2, .. })
        ));
    }

    #[test]
    fn it_stops_when_reports_run_out() {
        let dir = TempDir::new().unwrap();
        let mut service = test_service(&dir, 2, 1);
        let mut session = service.start().unwrap();
        let mut operator = Scripted {
            lap_times: [10.0].into(),
            ..Default::default()
        };

        let result = service.score(&mut session.population, &mut operator);

        assert!(matches!(
            result,
            Err(Error::ReportError(ReportError::Closed))
        ));
    }

    #[test]
    fn it_applies_custom_gains() {
        let dir = TempDir::new().unwrap();
        let mut service = test_service(&dir, 2, 1);
        let mut session = service.start().unwrap();
        let mut operator = Scripted {
            gains: [0.1, 0.2, 0.3, 0.4].into(),
            ..Default::default()
        };

        service
            .customize(&mut session.population, &mut operator)
            .unwrap();

        let gains: Vec<_> = session
            .population
            .chromosomes()
            .iter()
            .map(|c| c.gains().clone())
            .collect();
        assert_eq!(gains, vec![Gains::pd(0.1, 0.2), Gains::pd(0.3, 0.4)]);
    }

    #[test]
    fn it_records_the_best_of_a_generation() {
        let dir = TempDir::new().unwrap();
        let mut service = test_service(&dir, 3, 1);
        let mut session = service.start().unwrap();
        let mut operator = Scripted {
            lap_times: [12.1, 11.5, 13.0].into(),
            ..Default::default()
        };
        service.score(&mut session.population, &mut operator).unwrap();

        let elite = service.record_best(&session.population).unwrap();

        assert_eq!(elite.fitness(), Some(11.5));
        let records = service.best_log().read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].number, elite.serial_id());
    }

    #[test]
    fn it_refuses_to_record_an_unscored_generation() {
        let dir = TempDir::new().unwrap();
        let mut service = test_service(&dir, 2, 1);
        let session = service.start().unwrap();

        assert!(matches!(
            service.record_best(&session.population),
            Err(Error::UnscoredPopulation(1))
        ));
    }

    #[test]
    fn it_continues_serial_ids_after_a_snapshot() {
        let dir = TempDir::new().unwrap();
        let mut service = test_service(&dir, 2, 5);
        let mut session = service.start().unwrap();
        let mut operator = Scripted {
            lap_times: [10.0, 11.0].into(),
            ..Default::default()
        };
        service.score(&mut session.population, &mut operator).unwrap();

        let snapshots = snapshots::Repository::new(dir.path().join("pop.json"));
        snapshots.save(&session.population, 3).unwrap();

        let resumed = service.resume(&snapshots).unwrap();
        assert_eq!(resumed.population.generation(), 3);
        assert_eq!(resumed.counter.peek(), Some(3));

        service.serial_policy = SerialPolicy::Reset;
        let reset = service.resume(&snapshots).unwrap();
        assert_eq!(reset.counter.peek(), Some(1));
    }

    fn snapshot_of(
        dir: &TempDir,
        chromosomes: Vec<Chromosome>,
        generation: u32,
    ) -> snapshots::Repository {
        let snapshots = snapshots::Repository::new(dir.path().join("pop.json"));
        let population = Population::from_chromosomes(generation, chromosomes);
        snapshots.save(&population, generation).unwrap();
        snapshots
    }

    #[test]
    fn it_rejects_a_single_chromosome_snapshot_before_scoring() {
        let dir = TempDir::new().unwrap();
        let service = test_service(&dir, 3, 3);
        let lone = Chromosome::restore(1, 1, Gains::pd(0.5, 0.5), Some(10.0));
        let snapshots = snapshot_of(&dir, vec![lone.clone()], 1);

        assert!(matches!(
            service.resume(&snapshots),
            Err(Error::BreedError(BreedError::Selection(
                SelectionError::TooFewCandidates { provided: 1 }
            )))
        ));

        // Nothing is bred after the last generation, so it may be scored alone
        let last = snapshot_of(&dir, vec![lone], 3);
        assert_eq!(service.resume(&last).unwrap().population.size(), 1);
    }

    #[test]
    fn it_rejects_a_snapshot_that_exhausts_serial_ids() {
        let dir = TempDir::new().unwrap();
        let mut service = test_service(&dir, 2, 3);
        let snapshots = snapshot_of(
            &dir,
            vec![
                Chromosome::restore(1, 1, Gains::pd(0.5, 0.5), None),
                Chromosome::restore(1, u64::MAX, Gains::pd(0.2, 0.2), None),
            ],
            1,
        );

        assert!(matches!(
            service.resume(&snapshots),
            Err(Error::BreedError(BreedError::SerialIds(_)))
        ));

        service.serial_policy = SerialPolicy::Reset;
        assert_eq!(service.resume(&snapshots).unwrap().counter.peek(), Some(1));
    }

    #[test]
    fn it_rejects_a_snapshot_at_the_largest_generation() {
        let dir = TempDir::new().unwrap();
        let service = test_service(&dir, 2, 3);
        let snapshots = snapshot_of(
            &dir,
            vec![
                Chromosome::restore(1, 1, Gains::pd(0.5, 0.5), None),
                Chromosome::restore(u32::MAX, 2, Gains::pd(0.2, 0.2), None),
            ],
            1,
        );

        assert!(matches!(
            service.resume(&snapshots),
            Err(Error::BreedError(BreedError::GenerationOverflow(u32::MAX)))
        ));
    }
}
