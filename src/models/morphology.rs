use super::Gains;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::instrument;

/// The role a single gain plays in the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneKind {
    Proportional,
    Integral,
    Derivative,
}

impl GeneKind {
    /// Half-width of the uniform perturbation applied when this gene mutates.
    pub fn mutation_range(&self) -> f64 {
        match self {
            GeneKind::Proportional => 0.1,
            GeneKind::Integral => 0.1,
            GeneKind::Derivative => 0.3,
        }
    }

    /// Field name used in persisted records.
    pub fn key(&self) -> &'static str {
        match self {
            GeneKind::Proportional => "kp",
            GeneKind::Integral => "ki",
            GeneKind::Derivative => "kd",
        }
    }
}

impl fmt::Display for GeneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key().to_uppercase())
    }
}

/// The shape of the gain vector under optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Morphology {
    /// Proportional and derivative gains.
    #[default]
    Pd,
    /// Proportional, integral and derivative gains.
    Pid,
}

impl Morphology {
    pub fn genes(&self) -> &'static [GeneKind] {
        match self {
            Morphology::Pd => &[GeneKind::Proportional, GeneKind::Derivative],
            Morphology::Pid => &[
                GeneKind::Proportional,
                GeneKind::Integral,
                GeneKind::Derivative,
            ],
        }
    }

    /// Draws every gene uniformly from [0, 1].
    #[instrument(level = "debug", skip(rng), fields(morphology = ?self))]
    pub fn random<R: Rng>(&self, rng: &mut R) -> Gains {
        self.from_fn(|_| rng.random_range(0.0..=1.0))
    }

    /// Builds a gain vector of this shape by asking `f` for each gene in order.
    pub fn from_fn(&self, mut f: impl FnMut(GeneKind) -> f64) -> Gains {
        let kp = f(GeneKind::Proportional);
        let ki = match self {
            Morphology::Pd => None,
            Morphology::Pid => Some(f(GeneKind::Integral)),
        };
        let kd = f(GeneKind::Derivative);

        Gains { kp, ki, kd }
    }
}
