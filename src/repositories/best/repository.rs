use super::Error;
use crate::models::Chromosome;
use crate::repositories::records::ChromosomeRecord;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Append-only history of each generation's elite, one JSON record per line.
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

    /// Appends one record. Existing lines are never touched.
    #[instrument(level = "debug", skip(self, chromosome), fields(path = %self.path.display(), serial_id = chromosome.serial_id(), generation = chromosome.generation()))]
    pub fn append(&self, chromosome: &Chromosome) -> Result<(), Error> {
        let mut line = serde_json::to_string(&ChromosomeRecord::from(chromosome))?;
        line.push('\n');

        // Opened per call so every line is on disk before the run moves on
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        Ok(())
    }

    /// Reads every record in file order. A missing log is an empty history.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub fn read_all(&self) -> Result<Vec<ChromosomeRecord>, Error> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|source| Error::MalformedLine {
                    line: idx + 1,
                    source,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gains, SerialCounter};
    use tempfile::TempDir;

    fn test_repository() -> (Repository, TempDir) {
        let dir = TempDir::new().unwrap();
        let repository = Repository::new(dir.path().join("best_chromosomes.jsonl"));
        (repository, dir)
    }

    fn elite(counter: &mut SerialCounter, generation: u32, fitness: f64) -> Chromosome {
        let mut chromosome = Chromosome::new(generation, Gains::pd(0.5, 0.25), counter).unwrap();
        chromosome.set_fitness(fitness);
        chromosome
    }

    #[test]
    fn append_is_strictly_additive() {
        let (repository, _dir) = test_repository();
        let mut counter = SerialCounter::new();

        for (i, fitness) in [13.0, 12.5, 12.5, 11.0].into_iter().enumerate() {
            repository
                .append(&elite(&mut counter, i as u32 + 1, fitness))
                .unwrap();
        }

        let contents = fs::read_to_string(repository.path()).unwrap();
        assert_eq!(contents.lines().count(), 4);

        let records = repository.read_all().unwrap();
        let generations: Vec<u32> = records.iter().map(|r| r.generation).collect();
        let lap_times: Vec<Option<f64>> = records.iter().map(|r| r.lap_time).collect();
        assert_eq!(generations, vec![1, 2, 3, 4]);
        assert_eq!(
            lap_times,
            vec![Some(13.0), Some(12.5), Some(12.5), Some(11.0)]
        );
    }

    #[test]
    fn append_keeps_existing_history() {
        let (repository, _dir) = test_repository();
        fs::write(
            repository.path(),
            "{\"gen\": 9, \"number\": 40, \"kp\": 0.1, \"kd\": 0.2, \"lap_time\": 10.0}\n",
        )
        .unwrap();

        repository
            .append(&elite(&mut SerialCounter::new(), 1, 9.5))
            .unwrap();

        let records = repository.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].number, 40);
        assert_eq!(records[1].generation, 1);
    }

    #[test]
    fn read_all_of_missing_log_is_empty() {
        let (repository, _dir) = test_repository();
        assert!(repository.read_all().unwrap().is_empty());
    }

    #[test]
    fn read_all_reports_the_malformed_line() {
        let (repository, _dir) = test_repository();
        repository
            .append(&elite(&mut SerialCounter::new(), 1, 9.5))
            .unwrap();
        let mut file = OpenOptions::new()
            .append(true)
            .open(repository.path())
            .unwrap();
        file.write_all(b"{\"gen\": 2}\n").unwrap();

        assert!(matches!(
            repository.read_all(),
            Err(Error::MalformedLine { line: 2, .. })
        ));
    }
}
