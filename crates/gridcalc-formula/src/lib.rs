//! # gridcalc-formula
//!
//! Formula parser and evaluator for gridcalc.
//!
//! This crate provides:
//! - Formula parsing (text → builder callbacks → AST)
//! - Formula evaluation (AST → value)
//! - Reference shifting for copies
//! - Cycle detection over cell references
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::{CellValue, Position};
//! use gridcalc_formula::{evaluate, parse_formula, FormulaExpr};
//! use std::collections::BTreeMap;
//!
//! let mut cells: BTreeMap<Position, Option<FormulaExpr>> = BTreeMap::new();
//! cells.insert(Position::parse("A1").unwrap(), Some(FormulaExpr::Number(4.0)));
//!
//! let ast = parse_formula("=A1*2+1").unwrap();
//! assert_eq!(evaluate(&ast, &cells), CellValue::Number(9.0));
//! ```

pub mod ast;
pub mod builder;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use ast::{BinaryOperator, CellReference, FormulaExpr, UnaryOperator};
pub use builder::{AstBuilder, ExprBuilder, MAX_TREE_DEPTH};
pub use dependency::has_cycle;
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, EvaluationContext};
pub use parser::{parse_formula, parse_formula_with, MAX_NESTING};
