//! Unified error hierarchy for the allostat core
//!
//! Scoring errors carry structured context (date, field, value) so skipped
//! days can be surfaced to the caller with their exact reason, and integrate
//! with the tracing system via severity levels.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::Factor;

/// Top-level error type for all allostat operations
#[derive(Debug, Error)]
pub enum AllostatError {
    /// Scoring pipeline errors
    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    /// Report import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the scoring core.
///
/// `OutOfRangeInput` is fatal to a single day only; the pipeline records the
/// day as skipped and keeps scoring. `InsufficientHistory` and
/// `DegenerateCorrelation` are non-fatal signals handled inside the weight
/// adapter. `UnsortedInput` is a caller contract violation and fails the
/// whole batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// A report metric lies outside the [0,10] scale
    #[error("Out-of-range input on {date}: {field} = {value} (expected 0..=10)")]
    OutOfRangeInput {
        date: NaiveDate,
        field: &'static str,
        value: f64,
    },

    /// Input reports are not strictly increasing by date
    #[error("Unsorted input: {current} does not follow {previous}")]
    UnsortedInput {
        previous: NaiveDate,
        current: NaiveDate,
    },

    /// Too few days of history to adapt weights
    #[error("Insufficient history: {available} days available, {required} required")]
    InsufficientHistory { available: usize, required: usize },

    /// A zero-variance series makes a factor's correlation undefined
    #[error("Degenerate correlation for factor {factor}: zero variance in window")]
    DegenerateCorrelation { factor: Factor },
}

/// Report loading errors for the CLI import paths
#[derive(Debug, Error)]
pub enum ImportError {
    /// Unsupported input format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// CSV parsing failed
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record failed validation before reaching the pipeline
    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
}

/// Result type alias for allostat operations
pub type Result<T> = std::result::Result<T, AllostatError>;

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents the operation
    Error,
    /// Warning that doesn't prevent the batch from completing
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}

impl ScoringError {
    /// Whether the error fails the whole batch or only one day / one signal
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ScoringError::UnsortedInput { .. } => ErrorSeverity::Error,
            ScoringError::OutOfRangeInput { .. } => ErrorSeverity::Warning,
            ScoringError::InsufficientHistory { .. } => ErrorSeverity::Warning,
            ScoringError::DegenerateCorrelation { .. } => ErrorSeverity::Warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity() {
        let err = ScoringError::UnsortedInput {
            previous: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            current: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Error);

        let err = ScoringError::InsufficientHistory {
            available: 5,
            required: 14,
        };
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(
            err.severity().to_tracing_level(),
            tracing::Level::WARN
        );
    }

    #[test]
    fn test_out_of_range_message() {
        let err = ScoringError::OutOfRangeInput {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            field: "energy_level",
            value: 11.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("energy_level"));
        assert!(msg.contains("11.5"));
    }
}
