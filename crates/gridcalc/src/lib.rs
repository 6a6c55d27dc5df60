//! # gridcalc
//!
//! An in-memory spreadsheet core: a sparse grid of cells holding literals or
//! formulas, evaluated on demand.
//!
//! ## Features
//!
//! - Formulas with arithmetic, comparison and `$`-anchored cell references
//! - Reference cycles detected on every evaluation (they evaluate empty)
//! - Block copies that shift relative references
//! - Save/load to a delimited text stream guarded by a checksum
//!
//! ## Example
//!
//! ```rust
//! use gridcalc::prelude::*;
//!
//! let mut sheet = Spreadsheet::new();
//! sheet.set_cell("A1", "10").unwrap();
//! sheet.set_cell("A2", "20.5").unwrap();
//! sheet.set_cell("A3", "=A1+A2*2").unwrap();
//! assert_eq!(sheet.value("A3").unwrap(), CellValue::Number(51.0));
//!
//! // Copy A3 one column right: A1/A2 become B1/B2
//! let a3 = Position::parse("A3").unwrap();
//! sheet.copy_rect(Position::parse("B3").unwrap(), a3, 1, 1);
//! assert_eq!(sheet.value("B3").unwrap(), CellValue::Empty);
//!
//! let mut saved = Vec::new();
//! sheet.save(&mut saved).unwrap();
//!
//! let mut restored = Spreadsheet::new();
//! restored.load(saved.as_slice()).unwrap();
//! assert_eq!(restored.value("A3").unwrap(), CellValue::Number(51.0));
//! ```

pub mod error;
pub mod prelude;
pub mod spreadsheet;
pub mod stream;

pub use error::{Result, SpreadsheetError};
pub use spreadsheet::Spreadsheet;
pub use stream::{StreamOptions, StreamReader, StreamWriter};

// Re-export core types
pub use gridcalc_core::{CellValue, Position};

// Re-export formula types
pub use gridcalc_formula::{
    evaluate, has_cycle, parse_formula, parse_formula_with, AstBuilder, BinaryOperator,
    CellReference, EvaluationContext, ExprBuilder, FormulaError, FormulaExpr, FormulaResult,
    UnaryOperator,
};
