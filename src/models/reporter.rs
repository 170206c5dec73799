use super::{Chromosome, GeneKind};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The source of reports went away, e.g. stdin reached end of input.
    #[error("report source closed")]
    Closed,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supplies the measured lap time of a chromosome.
///
/// Implementations block until a finite value is available and retry on
/// malformed input themselves. Lower lap times are better.
pub trait FitnessReporter {
    fn report(&mut self, chromosome: &Chromosome) -> Result<f64, ReportError>;
}

/// The person driving an interactive tuning session.
pub trait Operator: FitnessReporter {
    /// Asks a yes/no question.
    fn confirm(&mut self, question: &str) -> Result<bool, ReportError>;

    /// Asks for a file path.
    fn path(&mut self, prompt: &str) -> Result<String, ReportError>;

    /// Asks for a replacement value of one gene.
    fn gain(&mut self, chromosome: &Chromosome, kind: GeneKind) -> Result<f64, ReportError>;

    /// Shows a line of session output.
    fn show(&mut self, line: &str) -> Result<(), ReportError>;
}
