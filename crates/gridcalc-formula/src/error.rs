//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while turning formula text into a tree
///
/// Evaluation never fails: faults evaluate to an empty value instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Reference text that does not name a cell
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

impl From<gridcalc_core::Error> for FormulaError {
    fn from(err: gridcalc_core::Error) -> Self {
        FormulaError::InvalidReference(err.to_string())
    }
}
