use crate::models::{Gains, Morphology};
use rand::Rng;
use rand_distr::{Distribution as _, Normal};
use serde::{Deserialize, Serialize};

/// How the first generation's gains are drawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Distribution {
    /// Every gene uniformly from [0, 1].
    #[default]
    Uniform,
    /// Every gene from N(center, deviation), folded to its absolute value and
    /// clamped into [0, 1]. Useful to start a search around known-good gains.
    Normal { center: Gains, deviation: f64 },
}

#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    #[error("deviation must be finite and non-negative, got: {0}")]
    InvalidDeviation(f64),
    #[error("center gains are {center:?} but the run tunes {morphology:?}")]
    LayoutMismatch {
        center: Morphology,
        morphology: Morphology,
    },
}

impl Distribution {
    pub fn uniform() -> Self {
        Self::Uniform
    }

    pub fn normal(center: Gains, deviation: f64) -> Result<Self, DistributionError> {
        if !deviation.is_finite() || deviation < 0.0 {
            return Err(DistributionError::InvalidDeviation(deviation));
        }

        Ok(Self::Normal { center, deviation })
    }

    /// Checks the distribution can produce gains of the given shape.
    pub fn validate(&self, morphology: Morphology) -> Result<(), DistributionError> {
        match self {
            Distribution::Uniform => Ok(()),
            Distribution::Normal { center, deviation } => {
                if !deviation.is_finite() || *deviation < 0.0 {
                    return Err(DistributionError::InvalidDeviation(*deviation));
                }
                if center.morphology() != morphology {
                    return Err(DistributionError::LayoutMismatch {
                        center: center.morphology(),
                        morphology,
                    });
                }
                Ok(())
            }
        }
    }

    /// Draws `n_samples` gain vectors of the given shape.
    pub fn distribute<R: Rng>(
        &self,
        rng: &mut R,
        morphology: Morphology,
        n_samples: usize,
    ) -> Result<Vec<Gains>, DistributionError> {
        self.validate(morphology)?;

        let samples = match self {
            Distribution::Uniform => (0..n_samples).map(|_| morphology.random(rng)).collect(),
            Distribution::Normal { center, deviation } => {
                normal_distribution(rng, center, *deviation, n_samples)?
            }
        };

        Ok(samples)
    }
}

fn normal_distribution<R: Rng>(
    rng: &mut R,
    center: &Gains,
    deviation: f64,
    n_samples: usize,
) -> Result<Vec<Gains>, DistributionError> {
    let morphology = center.morphology();

    // One normal per gene, centred on that gene's value
    let normals = center
        .genes()
        .into_iter()
        .map(|(kind, mean)| {
            Normal::new(mean, deviation)
                .map(|normal| (kind, normal))
                .map_err(|_| DistributionError::InvalidDeviation(deviation))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let samples = (0..n_samples)
        .map(|_| {
            morphology.from_fn(|kind| {
                normals
                    .iter()
                    .find(|(k, _)| *k == kind)
                    .map(|(_, normal)| normal.sample(rng).abs().min(1.0))
                    .unwrap_or_default()
            })
        })
        .collect();

    Ok(samples)
}
