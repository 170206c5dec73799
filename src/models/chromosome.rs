use super::{GeneKind, Morphology};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::instrument;

/// A controller gain vector. `ki` is present only for PID tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gains {
    pub kp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ki: Option<f64>,
    pub kd: f64,
}

#[derive(Debug, thiserror::Error)]
#[cfg_attr(test, derive(PartialEq))]
#[error("gain layouts differ: lhs={lhs:?}, rhs={rhs:?}")]
pub struct LayoutMismatch {
    pub lhs: Morphology,
    pub rhs: Morphology,
}

impl Gains {
    pub fn pd(kp: f64, kd: f64) -> Self {
        Self { kp, ki: None, kd }
    }

    pub fn pid(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki: Some(ki),
            kd,
        }
    }

    pub fn morphology(&self) -> Morphology {
        match self.ki {
            Some(_) => Morphology::Pid,
            None => Morphology::Pd,
        }
    }

    /// Gene values in declaration order (kp, [ki,] kd).
    pub fn values(&self) -> Vec<f64> {
        self.genes().into_iter().map(|(_, value)| value).collect()
    }

    pub fn genes(&self) -> Vec<(GeneKind, f64)> {
        let mut genes = Vec::with_capacity(3);
        genes.push((GeneKind::Proportional, self.kp));
        if let Some(ki) = self.ki {
            genes.push((GeneKind::Integral, ki));
        }
        genes.push((GeneKind::Derivative, self.kd));
        genes
    }

    pub fn genes_mut(&mut self) -> Vec<(GeneKind, &mut f64)> {
        let mut genes = Vec::with_capacity(3);
        genes.push((GeneKind::Proportional, &mut self.kp));
        if let Some(ki) = self.ki.as_mut() {
            genes.push((GeneKind::Integral, ki));
        }
        genes.push((GeneKind::Derivative, &mut self.kd));
        genes
    }

    pub fn get(&self, kind: GeneKind) -> Option<f64> {
        match kind {
            GeneKind::Proportional => Some(self.kp),
            GeneKind::Integral => self.ki,
            GeneKind::Derivative => Some(self.kd),
        }
    }

    /// Overwrites one gene. Setting `ki` on a PD vector is ignored.
    pub fn set(&mut self, kind: GeneKind, value: f64) {
        match kind {
            GeneKind::Proportional => self.kp = value,
            GeneKind::Integral => {
                if let Some(ki) = self.ki.as_mut() {
                    *ki = value;
                }
            }
            GeneKind::Derivative => self.kd = value,
        }
    }

    /// Combines two gain vectors of the same layout gene by gene.
    pub fn zip_with(
        &self,
        other: &Gains,
        mut f: impl FnMut(GeneKind, f64, f64) -> f64,
    ) -> Result<Gains, LayoutMismatch> {
        let (lhs, rhs) = (self.morphology(), other.morphology());
        if lhs != rhs {
            return Err(LayoutMismatch { lhs, rhs });
        }

        Ok(lhs.from_fn(|kind| {
            // Both sides share a layout, so every gene exists on both.
            let a = self.get(kind).unwrap_or_default();
            let b = other.get(kind).unwrap_or_default();
            f(kind, a, b)
        }))
    }
}

#[derive(Debug, thiserror::Error)]
#[cfg_attr(test, derive(PartialEq))]
#[error("serial ids exhausted: no id follows {}", u64::MAX)]
pub struct SerialIdsExhausted;

/// Hands out serial ids for newly created chromosomes.
///
/// Owned by the run rather than the process so that a resumed run can pick
/// the sequence up where the snapshot left it, or start over.
#[derive(Debug, Clone)]
pub struct SerialCounter {
    // None once u64::MAX has been handed out
    next: Option<u64>,
}

impl Default for SerialCounter {
    fn default() -> Self {
        Self { next: Some(1) }
    }
}

impl SerialCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A counter whose next id follows `last`.
    pub fn after(last: u64) -> Self {
        Self {
            next: last.checked_add(1),
        }
    }

    pub fn next_id(&mut self) -> Result<u64, SerialIdsExhausted> {
        let id = self.next.ok_or(SerialIdsExhausted)?;
        self.next = id.checked_add(1);
        Ok(id)
    }

    pub fn peek(&self) -> Option<u64> {
        self.next
    }

    /// Whether `count` more ids can be handed out.
    pub fn has_room_for(&self, count: u64) -> bool {
        match (self.next, count) {
            (_, 0) => true,
            (Some(next), count) => next.checked_add(count - 1).is_some(),
            (None, _) => false,
        }
    }
}

/// One candidate gain vector with its provenance and measured lap time.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    pub(crate) generation: u32,
    pub(crate) serial_id: u64,
    pub(crate) gains: Gains,
    pub(crate) fitness: Option<f64>,
}

impl Chromosome {
    #[instrument(level = "debug", skip(counter), fields(generation = generation, gains = ?gains))]
    pub fn new(
        generation: u32,
        gains: Gains,
        counter: &mut SerialCounter,
    ) -> Result<Self, SerialIdsExhausted> {
        Ok(Self {
            generation,
            serial_id: counter.next_id()?,
            gains,
            fitness: None,
        })
    }

    /// Rebuilds a chromosome with a known identity, e.g. from a persisted record.
    pub fn restore(generation: u32, serial_id: u64, gains: Gains, fitness: Option<f64>) -> Self {
        Self {
            generation,
            serial_id,
            gains,
            fitness,
        }
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn serial_id(&self) -> u64 {
        self.serial_id
    }

    pub fn gains(&self) -> &Gains {
        &self.gains
    }

    pub fn gains_mut(&mut self) -> &mut Gains {
        &mut self.gains
    }

    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    pub fn is_scored(&self) -> bool {
        self.fitness.is_some()
    }
}

impl fmt::Display for Gains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .genes()
            .into_iter()
            .map(|(kind, value)| format!("{kind}={value}"))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Chromosome {} (Gen {}): {}",
            self.serial_id, self.generation, self.gains
        )?;
        if let Some(fitness) = self.fitness {
            write!(f, ", Lap Time={fitness}")?;
        }
        Ok(())
    }
}
