//! Formula Abstract Syntax Tree types

use crate::error::{FormulaError, FormulaResult};
use gridcalc_core::Position;
use lazy_regex::regex_is_match;
use std::fmt;

/// Formula expression AST
///
/// Every node owns its children, so cloning a tree is a deep copy and two
/// cells never share a subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),

    // === References ===
    /// Single cell reference
    CellRef(CellReference),
    /// Reference that was shifted off the grid (`#REF!`)
    RefError,

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },
}

/// Cell reference with per-axis absolute flags (`$A$1`, `A$1`, `$A1`, `A1`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellReference {
    pub position: Position,
    pub col_absolute: bool,
    pub row_absolute: bool,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

impl BinaryOperator {
    /// Operator text as written in a formula
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }
}

impl CellReference {
    /// Create a relative reference to a position
    pub fn relative(position: Position) -> Self {
        Self {
            position,
            col_absolute: false,
            row_absolute: false,
        }
    }

    /// Parse a reference like `A1`, `$A1`, `A$1` or `$A$1`
    pub fn parse(text: &str) -> FormulaResult<Self> {
        let (col_absolute, rest) = match text.strip_prefix('$') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let letters_end = rest
            .bytes()
            .position(|b| !b.is_ascii_uppercase())
            .unwrap_or(rest.len());
        let (letters, rest) = rest.split_at(letters_end);

        let (row_absolute, digits) = match rest.strip_prefix('$') {
            Some(digits) => (true, digits),
            None => (false, rest),
        };

        let position = Position::parse(&format!("{}{}", letters, digits))
            .map_err(|e| FormulaError::InvalidReference(format!("'{}': {}", text, e)))?;

        Ok(Self {
            position,
            col_absolute,
            row_absolute,
        })
    }

    /// Shift the non-absolute axes, or `None` if the result leaves the grid
    pub fn shifted(&self, d_col: i64, d_row: i64) -> Option<Self> {
        let d_col = if self.col_absolute { 0 } else { d_col };
        let d_row = if self.row_absolute { 0 } else { d_row };
        Some(Self {
            position: self.position.offset(d_col, d_row)?,
            ..*self
        })
    }
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col_absolute {
            f.write_str("$")?;
        }
        f.write_str(&Position::column_to_letters(self.position.col))?;
        if self.row_absolute {
            f.write_str("$")?;
        }
        write!(f, "{}", self.position.row)
    }
}

impl FormulaExpr {
    /// Build a literal node from raw cell text that is not a formula
    ///
    /// Numeric-looking text (`10`, `-2.5`, `3e1`, `.5`) becomes a number,
    /// anything else is kept verbatim as a string.
    pub fn from_literal(text: &str) -> Self {
        if regex_is_match!(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?$", text) {
            if let Ok(n) = text.parse::<f64>() {
                return FormulaExpr::Number(n);
            }
        }
        FormulaExpr::String(text.to_string())
    }

    /// Convenience constructor for a binary node
    pub fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> Self {
        FormulaExpr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Convenience constructor for a negation node
    pub fn negate(operand: FormulaExpr) -> Self {
        FormulaExpr::UnaryOp {
            op: UnaryOperator::Negate,
            operand: Box::new(operand),
        }
    }

    /// Shift every relative reference axis by the given offset
    ///
    /// A reference pushed off the grid turns into [`FormulaExpr::RefError`].
    pub fn shift_references(&mut self, d_col: i64, d_row: i64) {
        match self {
            FormulaExpr::CellRef(cell_ref) => match cell_ref.shifted(d_col, d_row) {
                Some(shifted) => *cell_ref = shifted,
                None => *self = FormulaExpr::RefError,
            },
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.shift_references(d_col, d_row);
                right.shift_references(d_col, d_row);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.shift_references(d_col, d_row),
            FormulaExpr::Number(_) | FormulaExpr::String(_) | FormulaExpr::RefError => {}
        }
    }

    /// Positions referenced directly by this tree, in left-to-right order
    pub fn references(&self) -> Vec<Position> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references(&self, out: &mut Vec<Position>) {
        match self {
            FormulaExpr::CellRef(cell_ref) => out.push(cell_ref.position),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.collect_references(out);
                right.collect_references(out);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.collect_references(out),
            FormulaExpr::Number(_) | FormulaExpr::String(_) | FormulaExpr::RefError => {}
        }
    }
}

/// Canonical formula text (without the leading `=`)
///
/// Every operator application is parenthesized, numbers are written in
/// scientific notation with 15 fractional digits and strings are quoted with
/// embedded quotes doubled, so the output always re-parses to the same tree
/// shape.
impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::Number(n) => write_number(f, *n),
            FormulaExpr::String(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            FormulaExpr::CellRef(cell_ref) => write!(f, "{}", cell_ref),
            FormulaExpr::RefError => f.write_str("#REF!"),
            FormulaExpr::BinaryOp { op, left, right } => {
                write!(f, "({}{}{})", left, op.symbol(), right)
            }
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand,
            } => write!(f, "(-{})", operand),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    // The grammar has no negative literals.
    if n.is_sign_negative() && n != 0.0 {
        f.write_str("(-")?;
        write_number(f, -n)?;
        return f.write_str(")");
    }
    if n.is_infinite() {
        return f.write_str("1e999");
    }
    write!(f, "{:.16e}", n)
}
