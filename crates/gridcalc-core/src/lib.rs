//! # gridcalc-core
//!
//! Core data structures for the gridcalc formula engine.
//!
//! This crate provides the fundamental types used throughout gridcalc:
//! - [`Position`] - A grid coordinate and its `A1`-style text codec
//! - [`CellValue`] - The result of evaluating a cell (empty, number or text)
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::{CellValue, Position};
//!
//! let pos = Position::parse("AB12").unwrap();
//! assert_eq!(pos.col, 28);
//! assert_eq!(pos.row, 12);
//! assert_eq!(pos.to_string(), "AB12");
//!
//! assert_eq!(CellValue::from(2.5), CellValue::Number(2.5));
//! ```

pub mod cell;
pub mod error;

// Re-exports for convenience
pub use cell::{CellValue, Position};
pub use error::{Error, Result};
