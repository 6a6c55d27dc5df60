//! Callback interface between the formula parser and tree construction
//!
//! The parser reports what it recognizes in postfix order: operands first,
//! then the operator that combines them. [`AstBuilder`] turns that stream
//! into a [`FormulaExpr`] with a value stack.

use crate::ast::{BinaryOperator, CellReference, FormulaExpr};
use crate::error::{FormulaError, FormulaResult};

/// Receiver of parser events, in postfix order
pub trait ExprBuilder {
    fn op_add(&mut self) -> FormulaResult<()>;
    fn op_sub(&mut self) -> FormulaResult<()>;
    fn op_mul(&mut self) -> FormulaResult<()>;
    fn op_div(&mut self) -> FormulaResult<()>;
    fn op_pow(&mut self) -> FormulaResult<()>;
    fn op_neg(&mut self) -> FormulaResult<()>;
    fn op_eq(&mut self) -> FormulaResult<()>;
    fn op_ne(&mut self) -> FormulaResult<()>;
    fn op_lt(&mut self) -> FormulaResult<()>;
    fn op_le(&mut self) -> FormulaResult<()>;
    fn op_gt(&mut self) -> FormulaResult<()>;
    fn op_ge(&mut self) -> FormulaResult<()>;

    fn val_number(&mut self, value: f64) -> FormulaResult<()>;
    fn val_string(&mut self, value: String) -> FormulaResult<()>;
    /// A single cell reference such as `A1` or `$B$2`, or `#REF!`
    fn val_reference(&mut self, text: &str) -> FormulaResult<()>;
    /// A range such as `A1:B2`
    fn val_range(&mut self, text: &str) -> FormulaResult<()>;
    /// A call to `name` whose `arg_count` arguments were reported before it
    fn func_call(&mut self, name: &str, arg_count: usize) -> FormulaResult<()>;
}

/// Deepest expression tree [`AstBuilder`] builds
///
/// Trees are walked recursively (evaluation, display, copies), so their depth
/// is bounded. A long flat sum such as `=A1+A2+...` is left-deep and counts
/// one level per operator.
pub const MAX_TREE_DEPTH: usize = 256;

/// Stack-based [`ExprBuilder`] producing an owned expression tree
///
/// Ranges and function calls are not part of the node model: both callbacks
/// leave the stack as it is, so a lone range or a call with anything but a
/// single argument leaves the wrong number of nodes and
/// [`take_result`](AstBuilder::take_result) rejects it. A node that would
/// make the tree deeper than [`MAX_TREE_DEPTH`] is a parse error.
#[derive(Debug, Default)]
pub struct AstBuilder {
    /// Finished subtrees with their depth
    stack: Vec<(FormulaExpr, usize)>,
}

impl AstBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the finished tree
    ///
    /// Fails unless exactly one node is left on the stack.
    pub fn take_result(&mut self) -> FormulaResult<FormulaExpr> {
        if self.stack.len() != 1 {
            let count = self.stack.len();
            self.stack.clear();
            return Err(FormulaError::Parse(format!(
                "formula must reduce to one expression, found {}",
                count
            )));
        }
        self.pop().map(|(expr, _)| expr)
    }

    fn push(&mut self, expr: FormulaExpr, depth: usize) -> FormulaResult<()> {
        if depth > MAX_TREE_DEPTH {
            return Err(FormulaError::Parse(format!(
                "formula is nested deeper than {} levels",
                MAX_TREE_DEPTH
            )));
        }
        self.stack.push((expr, depth));
        Ok(())
    }

    fn leaf(&mut self, expr: FormulaExpr) -> FormulaResult<()> {
        self.push(expr, 1)
    }

    fn pop(&mut self) -> FormulaResult<(FormulaExpr, usize)> {
        self.stack
            .pop()
            .ok_or_else(|| FormulaError::Parse("operator is missing an operand".into()))
    }

    fn binary(&mut self, op: BinaryOperator) -> FormulaResult<()> {
        let (right, right_depth) = self.pop()?;
        let (left, left_depth) = self.pop()?;
        let depth = left_depth.max(right_depth) + 1;
        self.push(FormulaExpr::binary(op, left, right), depth)
    }
}

impl ExprBuilder for AstBuilder {
    fn op_add(&mut self) -> FormulaResult<()> {
        self.binary(BinaryOperator::Add)
    }

    fn op_sub(&mut self) -> FormulaResult<()> {
        self.binary(BinaryOperator::Subtract)
    }

    fn op_mul(&mut self) -> FormulaResult<()> {
        self.binary(BinaryOperator::Multiply)
    }

    fn op_div(&mut self) -> FormulaResult<()> {
        self.binary(BinaryOperator::Divide)
    }

    fn op_pow(&mut self) -> FormulaResult<()> {
        self.binary(BinaryOperator::Power)
    }

    fn op_neg(&mut self) -> FormulaResult<()> {
        let (operand, depth) = self.pop()?;
        self.push(FormulaExpr::negate(operand), depth + 1)
    }

    fn op_eq(&mut self) -> FormulaResult<()> {
        self.binary(BinaryOperator::Equal)
    }

    fn op_ne(&mut self) -> FormulaResult<()> {
        self.binary(BinaryOperator::NotEqual)
    }

    fn op_lt(&mut self) -> FormulaResult<()> {
        self.binary(BinaryOperator::LessThan)
    }

    fn op_le(&mut self) -> FormulaResult<()> {
        self.binary(BinaryOperator::LessEqual)
    }

    fn op_gt(&mut self) -> FormulaResult<()> {
        self.binary(BinaryOperator::GreaterThan)
    }

    fn op_ge(&mut self) -> FormulaResult<()> {
        self.binary(BinaryOperator::GreaterEqual)
    }

    fn val_number(&mut self, value: f64) -> FormulaResult<()> {
        self.leaf(FormulaExpr::Number(value))
    }

    fn val_string(&mut self, value: String) -> FormulaResult<()> {
        self.leaf(FormulaExpr::String(value))
    }

    fn val_reference(&mut self, text: &str) -> FormulaResult<()> {
        let node = if text == "#REF!" {
            FormulaExpr::RefError
        } else {
            FormulaExpr::CellRef(CellReference::parse(text)?)
        };
        self.leaf(node)
    }

    fn val_range(&mut self, _text: &str) -> FormulaResult<()> {
        Ok(())
    }

    fn func_call(&mut self, _name: &str, _arg_count: usize) -> FormulaResult<()> {
        Ok(())
    }
}
