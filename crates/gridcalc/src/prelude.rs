//! Prelude module - common imports for gridcalc users
//!
//! ```rust
//! use gridcalc::prelude::*;
//! ```

pub use crate::{
    // Cell types
    CellValue,
    Position,

    // Formula types
    FormulaExpr,

    // Main types
    Spreadsheet,
    SpreadsheetError,
    Result,

    // I/O types
    StreamOptions,
    StreamReader,
    StreamWriter,
};
