mod breeder;
mod chromosome;
mod crossover;
mod distribution;
mod morphology;
mod mutagen;
mod population;
mod reporter;
mod selector;

pub use breeder::{BreedError, Breeder};
pub use chromosome::{Chromosome, Gains, LayoutMismatch, SerialCounter, SerialIdsExhausted};
pub use crossover::Crossover;
pub use distribution::{Distribution, DistributionError};
pub use morphology::{GeneKind, Morphology};
pub use mutagen::{Mutagen, MutationRate, MutationRateOutOfRange};
pub use population::{Population, PopulationError};
pub use reporter::{FitnessReporter, Operator, ReportError};
pub use selector::{Ranking, SelectionError, Selector};
