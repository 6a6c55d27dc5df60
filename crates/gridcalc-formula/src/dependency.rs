//! Reference cycle detection for formula evaluation

use crate::ast::FormulaExpr;
use crate::evaluator::EvaluationContext;
use ahash::AHashSet;
use gridcalc_core::Position;

/// Check whether a reference cycle is reachable from `root`
///
/// Walks every position the tree references, following each cell's own tree
/// in turn. A position met again while it is still on the current path is a
/// cycle. A position whose references were fully explored once is never
/// walked again, so shared precedents (diamonds) are visited once and are not
/// reported as cycles. The walk keeps its path on the heap, so reference
/// chains of any length are fine.
pub fn has_cycle<C: EvaluationContext + ?Sized>(root: &FormulaExpr, ctx: &C) -> bool {
    CycleDetector::new(ctx).run(root)
}

/// Depth-first walker over the reference graph
struct CycleDetector<'a, C: ?Sized> {
    ctx: &'a C,
    /// Positions on the current DFS path
    in_stack: AHashSet<Position>,
    /// Positions proven acyclic
    visited: AHashSet<Position>,
}

impl<'a, C: EvaluationContext + ?Sized> CycleDetector<'a, C> {
    fn new(ctx: &'a C) -> Self {
        Self {
            ctx,
            in_stack: AHashSet::new(),
            visited: AHashSet::new(),
        }
    }

    fn run(&mut self, root: &FormulaExpr) -> bool {
        let ctx = self.ctx;
        let mut roots = root.references().into_iter();
        // The current path: each cell with the precedents it has left to walk
        let mut path: Vec<(Position, std::vec::IntoIter<Position>)> = Vec::new();

        loop {
            let next = match path.last_mut() {
                Some((_, precedents)) => precedents.next(),
                None => roots.next(),
            };

            let Some(pos) = next else {
                match path.pop() {
                    Some((done, _)) => {
                        self.in_stack.remove(&done);
                        self.visited.insert(done);
                        continue;
                    }
                    None => return false,
                }
            };

            if self.in_stack.contains(&pos) {
                return true;
            }
            if self.visited.contains(&pos) {
                continue;
            }

            match ctx.formula_at(pos) {
                Some(expr) => {
                    self.in_stack.insert(pos);
                    path.push((pos, expr.references().into_iter()));
                }
                None => {
                    self.visited.insert(pos);
                }
            }
        }
    }
}
