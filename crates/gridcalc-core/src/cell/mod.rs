//! Cell-related types
//!
//! This module contains:
//! - [`Position`] - A cell's location (e.g., "A1")
//! - [`CellValue`] - The value a cell evaluates to

mod position;
mod value;

pub use position::Position;
pub use value::CellValue;
