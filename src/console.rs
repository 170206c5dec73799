//! Line-oriented terminal operator.

use crate::models::{Chromosome, FitnessReporter, GeneKind, Operator, ReportError};
use std::io::{BufRead, Write};

/// Drives a session over a reader and a writer, normally stdin and stdout.
///
/// Numeric prompts repeat until a finite number is entered. End of input
/// surfaces as [`ReportError::Closed`].
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn ask(&mut self, prompt: &str) -> Result<String, ReportError> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ReportError::Closed);
        }
        Ok(line.trim().to_string())
    }

    fn ask_number(&mut self, prompt: &str, what: &str) -> Result<f64, ReportError> {
        loop {
            let answer = self.ask(prompt)?;
            match answer.parse::<f64>() {
                Ok(value) if value.is_finite() => return Ok(value),
                _ => {
                    tracing::warn!(answer = %answer, "Rejected numeric input");
                    writeln!(self.output, "Invalid input. Please enter a valid {what}.")?;
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> FitnessReporter for Console<R, W> {
    fn report(&mut self, chromosome: &Chromosome) -> Result<f64, ReportError> {
        self.ask_number(
            &format!(
                "Enter lap time for Chromosome {} (Gen {}): ",
                chromosome.serial_id(),
                chromosome.generation()
            ),
            "lap time",
        )
    }
}

impl<R: BufRead, W: Write> Operator for Console<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool, ReportError> {
        let answer = self.ask(&format!("{question} (y/n): "))?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }

    fn path(&mut self, prompt: &str) -> Result<String, ReportError> {
        self.ask(&format!("{prompt}: "))
    }

    fn gain(&mut self, chromosome: &Chromosome, kind: GeneKind) -> Result<f64, ReportError> {
        self.ask_number(
            &format!("Enter {kind} for chromosome {}: ", chromosome.serial_id()),
            "number",
        )
    }

    fn show(&mut self, line: &str) -> Result<(), ReportError> {
        writeln!(self.output, "{line}")?;
        Ok(())
    }
}
