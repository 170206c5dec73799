use crate::models::{Chromosome, Gains, GeneKind, LayoutMismatch};
use rand::Rng;
use tracing::instrument;

/// Arithmetic blend of two gain vectors with a weight chosen per gene.
#[instrument(level = "debug", skip(lhs, rhs, weight), fields(lhs = ?lhs, rhs = ?rhs))]
fn crossover_blend(
    lhs: &Gains,
    rhs: &Gains,
    mut weight: impl FnMut(GeneKind) -> f64,
) -> Result<Gains, LayoutMismatch> {
    lhs.zip_with(rhs, |kind, a, b| {
        let alpha = weight(kind);
        alpha * a + (1.0 - alpha) * b
    })
}

/// Crossover strategy for combining the gains of two parents.
///
/// Gains are continuous, so the child takes a weighted average of its parents
/// instead of swapping discrete genes.
///
/// ```rust
/// use gain_tuner::models::{Crossover, Gains};
///
/// let child = Crossover::blend()
///     .apply_with(&Gains::pd(0.2, 0.4), &Gains::pd(0.8, 0.1), |_| 0.5)?;
/// assert!((child.kp - 0.5).abs() < 1e-12);
/// assert!((child.kd - 0.25).abs() < 1e-12);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub enum Crossover {
    /// For each gene draw α uniformly from [0, 1] and take `α·lhs + (1-α)·rhs`.
    ///
    /// - `α = 1.0`: the gene is copied from the first parent
    /// - `α = 0.0`: the gene is copied from the second parent
    #[default]
    Blend,
}

impl Crossover {
    pub fn blend() -> Self {
        Self::Blend
    }

    /// Blends two gain vectors with a random weight per gene.
    pub fn apply<R: Rng>(
        &self,
        rng: &mut R,
        lhs: &Gains,
        rhs: &Gains,
    ) -> Result<Gains, LayoutMismatch> {
        self.apply_with(lhs, rhs, |_| rng.random_range(0.0..=1.0))
    }

    /// Blends two gain vectors using the weight returned by `weight` for each gene.
    pub fn apply_with(
        &self,
        lhs: &Gains,
        rhs: &Gains,
        weight: impl FnMut(GeneKind) -> f64,
    ) -> Result<Gains, LayoutMismatch> {
        match self {
            Self::Blend => crossover_blend(lhs, rhs, weight),
        }
    }

    /// Generation assigned to a child of `lhs` and `rhs`, or `None` when the
    /// newest parent is already at `u32::MAX`.
    pub fn child_generation(lhs: &Chromosome, rhs: &Chromosome) -> Option<u32> {
        lhs.generation().max(rhs.generation()).checked_add(1)
    }
}
