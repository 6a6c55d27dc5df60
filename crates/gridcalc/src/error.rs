//! Spreadsheet error types

use gridcalc_formula::FormulaError;
use thiserror::Error;

/// Result type for spreadsheet operations
pub type Result<T> = std::result::Result<T, SpreadsheetError>;

/// Errors that can occur while editing, saving or loading a spreadsheet
///
/// Evaluation never fails: see [`Spreadsheet::get_value`](crate::Spreadsheet::get_value).
#[derive(Debug, Error)]
pub enum SpreadsheetError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] gridcalc_core::Error),

    /// Formula text that does not parse
    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),

    /// Malformed persisted stream
    #[error("Invalid record {record}: {message}")]
    LoadFormat { record: usize, message: String },

    /// Persisted checksum does not match the loaded records
    #[error("Checksum mismatch: stored {expected}, computed {actual}")]
    ChecksumMismatch { expected: u64, actual: u64 },
}

impl SpreadsheetError {
    pub(crate) fn load_format(record: usize, message: impl Into<String>) -> Self {
        SpreadsheetError::LoadFormat {
            record,
            message: message.into(),
        }
    }
}
