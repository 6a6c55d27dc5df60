//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values. Evaluation never fails: every
//! fault (type mismatch, division by zero, missing reference) produces
//! [`CellValue::Empty`], which then flows into the parent expression.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use ahash::{AHashMap, AHashSet};
use gridcalc_core::{CellValue, Position};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Source of cell formulas for reference resolution
pub trait EvaluationContext {
    /// The formula stored at `pos`, if the cell holds one
    fn formula_at(&self, pos: Position) -> Option<&FormulaExpr>;
}

impl EvaluationContext for BTreeMap<Position, Option<FormulaExpr>> {
    fn formula_at(&self, pos: Position) -> Option<&FormulaExpr> {
        self.get(&pos).and_then(Option::as_ref)
    }
}

/// Evaluate a formula expression
///
/// Referenced cells are evaluated first, precedents before dependents, from
/// an explicit work list, so the depth of a reference chain does not matter.
/// Each cell reached is evaluated once per call. A reference that closes a
/// cycle contributes [`CellValue::Empty`]; callers that need cycles to
/// poison the whole result check [`has_cycle`](crate::dependency::has_cycle)
/// first.
pub fn evaluate<C: EvaluationContext + ?Sized>(expr: &FormulaExpr, ctx: &C) -> CellValue {
    let mut evaluator = Evaluator::new(ctx);
    evaluator.resolve(expr);
    evaluator.eval(expr)
}

/// Single evaluation pass over a context
struct Evaluator<'a, C: ?Sized> {
    ctx: &'a C,
    /// Values of the cells resolved so far
    values: AHashMap<Position, CellValue>,
}

impl<'a, C: EvaluationContext + ?Sized> Evaluator<'a, C> {
    fn new(ctx: &'a C) -> Self {
        Self {
            ctx,
            values: AHashMap::new(),
        }
    }

    /// Fill `values` for every cell reachable from `root`
    fn resolve(&mut self, root: &FormulaExpr) {
        let ctx = self.ctx;
        // Cells whose precedents are queued but not all resolved yet
        let mut waiting: AHashSet<Position> = AHashSet::new();
        let mut work = root.references();

        while let Some(&pos) = work.last() {
            if self.values.contains_key(&pos) {
                work.pop();
                continue;
            }

            let Some(expr) = ctx.formula_at(pos) else {
                work.pop();
                self.values.insert(pos, CellValue::Empty);
                continue;
            };

            if waiting.insert(pos) {
                // A waiting precedent is an ancestor of `pos`: that edge closes a cycle
                let pending: Vec<Position> = expr
                    .references()
                    .into_iter()
                    .filter(|p| !self.values.contains_key(p) && !waiting.contains(p))
                    .collect();
                work.extend(pending);
            } else {
                work.pop();
                let value = self.eval(expr);
                self.values.insert(pos, value);
            }
        }
    }

    /// Evaluate a tree whose references are already resolved
    fn eval(&self, expr: &FormulaExpr) -> CellValue {
        match expr {
            // === Literals ===
            FormulaExpr::Number(n) => CellValue::Number(*n),
            FormulaExpr::String(s) => CellValue::String(s.clone()),

            // === References ===
            FormulaExpr::CellRef(cell_ref) => self
                .values
                .get(&cell_ref.position)
                .cloned()
                .unwrap_or(CellValue::Empty),
            FormulaExpr::RefError => CellValue::Empty,

            // === Operators ===
            FormulaExpr::BinaryOp { op, left, right } => {
                let left_val = self.eval(left);
                let right_val = self.eval(right);
                evaluate_binary_op(*op, left_val, right_val)
            }
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand,
            } => match self.eval(operand) {
                CellValue::Number(n) => CellValue::Number(-n),
                _ => CellValue::Empty,
            },
        }
    }
}

/// Combine two evaluated operands
fn evaluate_binary_op(op: BinaryOperator, left: CellValue, right: CellValue) -> CellValue {
    match op {
        // Arithmetic operators
        BinaryOperator::Add => match (left, right) {
            (CellValue::Number(l), CellValue::Number(r)) => CellValue::Number(l + r),
            (CellValue::String(l), CellValue::String(r)) => CellValue::String(l + &r),
            _ => CellValue::Empty,
        },
        BinaryOperator::Subtract => numeric(left, right, |l, r| Some(l - r)),
        BinaryOperator::Multiply => numeric(left, right, |l, r| Some(l * r)),
        BinaryOperator::Divide => numeric(left, right, |l, r| (r != 0.0).then(|| l / r)),
        BinaryOperator::Power => numeric(left, right, |l, r| Some(l.powf(r))),

        // Equality never fails
        BinaryOperator::Equal => CellValue::from(left == right),
        BinaryOperator::NotEqual => CellValue::from(left != right),

        // Ordering needs two numbers or two strings
        BinaryOperator::LessThan => compare(&left, &right, Ordering::is_lt),
        BinaryOperator::LessEqual => compare(&left, &right, Ordering::is_le),
        BinaryOperator::GreaterThan => compare(&left, &right, Ordering::is_gt),
        BinaryOperator::GreaterEqual => compare(&left, &right, Ordering::is_ge),
    }
}

fn numeric(left: CellValue, right: CellValue, f: impl FnOnce(f64, f64) -> Option<f64>) -> CellValue {
    match (left, right) {
        (CellValue::Number(l), CellValue::Number(r)) => {
            f(l, r).map_or(CellValue::Empty, CellValue::Number)
        }
        _ => CellValue::Empty,
    }
}

fn compare(left: &CellValue, right: &CellValue, test: fn(Ordering) -> bool) -> CellValue {
    let ordering = match (left, right) {
        (CellValue::Number(l), CellValue::Number(r)) => l.partial_cmp(r),
        (CellValue::String(l), CellValue::String(r)) => Some(l.as_bytes().cmp(r.as_bytes())),
        _ => return CellValue::Empty,
    };
    // NaN is unordered: every ordering test is false, as with IEEE operators
    CellValue::from(ordering.map_or(false, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;

    type Cells = BTreeMap<Position, Option<FormulaExpr>>;

    fn eval_in(cells: &Cells, formula: &str) -> CellValue {
        let ast = parse_formula(formula).unwrap();
        evaluate(&ast, cells)
    }

    fn eval(formula: &str) -> CellValue {
        eval_in(&Cells::new(), formula)
    }

    fn sample_cells() -> Cells {
        let mut cells = Cells::new();
        for (name, text) in [("A1", "10"), ("A2", "20.5"), ("A3", "30"), ("A4", "abc")] {
            cells.insert(
                Position::parse(name).unwrap(),
                Some(FormulaExpr::from_literal(text)),
            );
        }
        cells.insert(Position::parse("A5").unwrap(), None);
        cells
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("=1+2"), CellValue::Number(3.0));
        assert_eq!(eval("=10-3"), CellValue::Number(7.0));
        assert_eq!(eval("=4*5"), CellValue::Number(20.0));
        assert_eq!(eval("=20/4"), CellValue::Number(5.0));
        assert_eq!(eval("=2^10"), CellValue::Number(1024.0));
        assert_eq!(eval("=-5"), CellValue::Number(-5.0));
        assert_eq!(eval("=--5"), CellValue::Number(5.0));
    }

    #[test]
    fn test_evaluate_precedence() {
        assert_eq!(eval("=1+2*3"), CellValue::Number(7.0));
        assert_eq!(eval("=(1+2)*3"), CellValue::Number(9.0));
        // Negation binds looser than power
        assert_eq!(eval("=-2^2"), CellValue::Number(-4.0));
        assert_eq!(eval("=2^-1"), CellValue::Number(0.5));
    }

    #[test]
    fn test_evaluate_with_references() {
        let cells = sample_cells();
        assert_eq!(eval_in(&cells, "=A1+A2*A3"), CellValue::Number(625.0));
        assert_eq!(eval_in(&cells, "= -A1 ^ 2 - A2 / 2   "), CellValue::Number(-110.25));
        assert_eq!(eval_in(&cells, "= 2 ^ $A$1"), CellValue::Number(1024.0));
        assert_eq!(eval_in(&cells, "=($A1+A$2)^2"), CellValue::Number(930.25));
    }

    #[test]
    fn test_missing_and_empty_references() {
        let cells = sample_cells();
        assert_eq!(eval_in(&cells, "=A5"), CellValue::Empty);
        assert_eq!(eval_in(&cells, "=A99"), CellValue::Empty);
        assert_eq!(eval_in(&cells, "=A99+1"), CellValue::Empty);
        assert_eq!(eval_in(&cells, "=#REF!"), CellValue::Empty);
    }

    #[test]
    fn test_type_mismatch_is_empty() {
        let cells = sample_cells();
        assert_eq!(eval_in(&cells, "=A1+A4"), CellValue::Empty);
        assert_eq!(eval_in(&cells, "=A4*2"), CellValue::Empty);
        assert_eq!(eval_in(&cells, "=-A4"), CellValue::Empty);
        assert_eq!(eval("=\"a\"-\"b\""), CellValue::Empty);
        assert_eq!(eval("=\"a\"^2"), CellValue::Empty);
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(eval("=\"Hello \"+\"World\""), CellValue::string("Hello World"));
        assert_eq!(eval("=\"n\"+1"), CellValue::Empty);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("=1/0"), CellValue::Empty);
        assert_eq!(eval("=1/(2-2)"), CellValue::Empty);
        assert_eq!(eval("=0/5"), CellValue::Number(0.0));
    }

    #[test]
    fn test_power_propagates_float_result() {
        assert_eq!(eval("=0^-1"), CellValue::Number(f64::INFINITY));
        match eval("=(-8)^(1/3)") {
            CellValue::Number(n) => assert!(n.is_nan()),
            other => panic!("Expected NaN, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison() {
        assert_eq!(eval("=1<2"), CellValue::Number(1.0));
        assert_eq!(eval("=1>2"), CellValue::Number(0.0));
        assert_eq!(eval("=5<=5"), CellValue::Number(1.0));
        assert_eq!(eval("=5>=6"), CellValue::Number(0.0));
        assert_eq!(eval("=\"abc\"<\"abd\""), CellValue::Number(1.0));
        assert_eq!(eval("=\"B\"<\"a\""), CellValue::Number(1.0));
        assert_eq!(eval("=1<\"a\""), CellValue::Empty);
        assert_eq!(eval("=A1<1"), CellValue::Empty);
    }

    #[test]
    fn test_equality_never_empty() {
        assert_eq!(eval("=5=5"), CellValue::Number(1.0));
        assert_eq!(eval("=5<>5"), CellValue::Number(0.0));
        assert_eq!(eval("=\"a\"=\"a\""), CellValue::Number(1.0));
        assert_eq!(eval("=1=\"1\""), CellValue::Number(0.0));
        assert_eq!(eval("=1<>\"1\""), CellValue::Number(1.0));
        // Two empty values are equal
        assert_eq!(eval("=A1=B1"), CellValue::Number(1.0));
        assert_eq!(eval("=(1/0)=A1"), CellValue::Number(1.0));
        assert_eq!(eval("=A1=0"), CellValue::Number(0.0));
    }

    #[test]
    fn test_long_reference_chain() {
        let mut cells = Cells::new();
        cells.insert(Position::new(1, 1), Some(FormulaExpr::Number(1.0)));
        for row in 2..=50_000 {
            let formula = format!("=A{}+1", row - 1);
            cells.insert(Position::new(1, row), Some(parse_formula(&formula).unwrap()));
        }
        assert_eq!(eval_in(&cells, "=A50000"), CellValue::Number(50_000.0));
        assert_eq!(eval_in(&cells, "=A50000-A1"), CellValue::Number(49_999.0));
    }

    #[test]
    fn test_shared_precedents_are_reused() {
        let mut cells = sample_cells();
        cells.insert(Position::parse("B1").unwrap(), Some(parse_formula("=A1*2").unwrap()));
        cells.insert(Position::parse("B2").unwrap(), Some(parse_formula("=B1+B1").unwrap()));
        cells.insert(Position::parse("B3").unwrap(), Some(parse_formula("=B2+B1").unwrap()));
        assert_eq!(eval_in(&cells, "=B3+B2+B1"), CellValue::Number(120.0));
    }

    #[test]
    fn test_cycle_edge_is_empty() {
        let mut cells = Cells::new();
        cells.insert(Position::parse("Z5").unwrap(), Some(parse_formula("=Z6+20").unwrap()));
        cells.insert(Position::parse("Z6").unwrap(), Some(parse_formula("=Z5-6").unwrap()));
        cells.insert(Position::parse("Z7").unwrap(), Some(parse_formula("=Z7").unwrap()));

        // Evaluation terminates; the edge back into the loop reads as Empty
        assert_eq!(eval_in(&cells, "=Z5"), CellValue::Empty);
        assert_eq!(eval_in(&cells, "=Z7"), CellValue::Empty);
        assert_eq!(eval_in(&cells, "=Z7=Z8"), CellValue::Number(1.0));
    }
}
