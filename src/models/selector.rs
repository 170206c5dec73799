use crate::models::Chromosome;
use rand::Rng;
use tracing::instrument;

/// Errors that can occur during parent selection.
#[derive(Debug, thiserror::Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum SelectionError {
    /// Selection needs an elite and at least one other candidate.
    #[error("population must hold at least 2 chromosomes to breed, got {provided}")]
    TooFewCandidates { provided: usize },

    /// A candidate was not scored before selection.
    #[error("chromosome {serial_id} (gen {generation}) has no fitness")]
    Unscored { serial_id: u64, generation: u32 },
}

/// Candidates ordered best-first, ready for breeding.
#[derive(Debug)]
pub struct Ranking<'a> {
    ranked: Vec<&'a Chromosome>,
}

impl<'a> Ranking<'a> {
    /// The fittest (lowest lap time) candidate.
    pub fn elite(&self) -> &'a Chromosome {
        self.ranked[0]
    }

    /// Every candidate except the elite, best-first.
    pub fn remainder(&self) -> &[&'a Chromosome] {
        &self.ranked[1..]
    }

    /// Draws a uniformly random partner from the non-elite remainder.
    pub fn partner<R: Rng>(&self, rng: &mut R) -> &'a Chromosome {
        let remainder = self.remainder();
        remainder[rng.random_range(0..remainder.len())]
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Parent selection strategy.
///
/// The only strategy pairs the elite with a random member of the rest of the
/// population, which biases search around the current best while mutation
/// supplies exploration.
#[derive(Debug, Clone, Default)]
#[cfg_attr(test, derive(PartialEq))]
pub enum Selector {
    #[default]
    Elitist,
}

impl Selector {
    pub fn elitist() -> Self {
        Self::Elitist
    }

    /// Sorts candidates by ascending lap time. Ties keep their original order.
    #[instrument(level = "debug", skip(self, candidates), fields(method = ?self, num_candidates = candidates.len()))]
    pub fn rank<'a>(&self, candidates: &'a [Chromosome]) -> Result<Ranking<'a>, SelectionError> {
        if candidates.len() < 2 {
            return Err(SelectionError::TooFewCandidates {
                provided: candidates.len(),
            });
        }

        let mut scored = Vec::with_capacity(candidates.len());
        for chromosome in candidates {
            let fitness = chromosome.fitness().ok_or(SelectionError::Unscored {
                serial_id: chromosome.serial_id(),
                generation: chromosome.generation(),
            })?;
            scored.push((chromosome, fitness));
        }

        // sort_by is stable
        scored.sort_by(|(_, a), (_, b)| a.total_cmp(b));

        Ok(Ranking {
            ranked: scored.into_iter().map(|(chromosome, _)| chromosome).collect(),
        })
    }

    /// Picks `num_pairs` parent pairs: the elite, and a random non-elite partner
    /// drawn with replacement for each pair.
    #[instrument(level = "debug", skip(self, ranking, rng), fields(num_pairs = num_pairs, num_candidates = ranking.len()))]
    pub fn select_parents<'a, R: Rng>(
        &self,
        num_pairs: usize,
        ranking: &Ranking<'a>,
        rng: &mut R,
    ) -> Vec<(&'a Chromosome, &'a Chromosome)> {
        match self {
            Selector::Elitist => (0..num_pairs)
                .map(|_| (ranking.elite(), ranking.partner(rng)))
                .collect(),
        }
    }
}
