//! The cell store

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::stream::{StreamOptions, StreamReader, StreamWriter};
use gridcalc_core::{CellValue, Position};
use gridcalc_formula::{evaluate, has_cycle, parse_formula, FormulaExpr};

/// A sparse grid of formula cells
///
/// Every cell is either absent, explicitly empty (`None`) or holds its own
/// expression tree. Values are computed on demand from the current contents;
/// nothing is cached.
#[derive(Debug, Clone, Default)]
pub struct Spreadsheet {
    /// Cell contents, ordered by column then row
    cells: BTreeMap<Position, Option<FormulaExpr>>,
}

impl Spreadsheet {
    /// Create an empty spreadsheet
    pub fn new() -> Self {
        Self::default()
    }

    // === Contents ===

    /// Set the contents of a cell from text
    ///
    /// - `""` empties the cell.
    /// - Text starting with `=` is parsed as a formula. On a parse error the
    ///   previous contents are kept.
    /// - Anything else is a literal: numeric text becomes a number, other
    ///   text is stored verbatim.
    ///
    /// Positions in column 0 are rejected and the store is left unchanged.
    ///
    /// # Example
    /// ```rust
    /// use gridcalc::prelude::*;
    ///
    /// let mut sheet = Spreadsheet::new();
    /// let a1 = Position::parse("A1").unwrap();
    /// sheet.set_contents(a1, "10").unwrap();
    /// sheet.set_contents(Position::parse("A2").unwrap(), "=A1*2").unwrap();
    /// assert_eq!(sheet.get_value(Position::parse("A2").unwrap()), CellValue::Number(20.0));
    /// ```
    pub fn set_contents(&mut self, pos: Position, text: &str) -> Result<()> {
        pos.validate()?;

        let expr = if text.is_empty() {
            None
        } else if text.starts_with('=') {
            match parse_formula(text) {
                Ok(expr) => Some(expr),
                Err(e) => {
                    log::warn!("rejected formula for {}: {:?}: {}", pos, text, e);
                    return Err(e.into());
                }
            }
        } else {
            Some(FormulaExpr::from_literal(text))
        };

        self.cells.insert(pos, expr);
        Ok(())
    }

    /// Set the contents of a cell addressed in A1 notation
    pub fn set_cell(&mut self, address: &str, text: &str) -> Result<()> {
        let pos = Position::parse(address)?;
        self.set_contents(pos, text)
    }

    /// Canonical formula text of a cell (`=`-prefixed), if it holds one
    pub fn contents(&self, pos: Position) -> Option<String> {
        self.formula(pos).map(|expr| format!("={}", expr))
    }

    /// Expression tree of a cell, if it holds one
    pub fn formula(&self, pos: Position) -> Option<&FormulaExpr> {
        self.cells.get(&pos).and_then(Option::as_ref)
    }

    // === Values ===

    /// Evaluate a cell
    ///
    /// Absent and empty cells, and cells from which a reference cycle can be
    /// reached, are [`CellValue::Empty`].
    pub fn get_value(&self, pos: Position) -> CellValue {
        let Some(expr) = self.formula(pos) else {
            return CellValue::Empty;
        };

        if has_cycle(expr, &self.cells) {
            log::trace!("{} reaches a reference cycle", pos);
            return CellValue::Empty;
        }

        evaluate(expr, &self.cells)
    }

    /// Evaluate a cell addressed in A1 notation
    pub fn value(&self, address: &str) -> Result<CellValue> {
        Ok(self.get_value(Position::parse(address)?))
    }

    // === Copy ===

    /// Copy a `width` × `height` block whose top-left cell is `src` so that
    /// it starts at `dst`
    ///
    /// Relative references in the copied formulas move by the distance
    /// between `dst` and `src`; absolute axes stay. Empty or absent source
    /// cells make the target empty. The source block is read in full before
    /// anything is written, so overlapping blocks copy correctly. Cells
    /// whose source or target would leave the grid are skipped.
    pub fn copy_rect(&mut self, dst: Position, src: Position, width: u32, height: u32) {
        if dst == src {
            return;
        }

        let d_col = i64::from(dst.col) - i64::from(src.col);
        let d_row = i64::from(dst.row) - i64::from(src.row);

        let mut staged = Vec::new();
        for i in 0..i64::from(width) {
            for j in 0..i64::from(height) {
                let Some(from) = src.offset(i, j) else { continue };
                let Some(to) = dst.offset(i, j) else { continue };
                staged.push((to, self.formula(from).cloned()));
            }
        }

        for (to, mut expr) in staged {
            if let Some(expr) = expr.as_mut() {
                expr.shift_references(d_col, d_row);
            }
            self.cells.insert(to, expr);
        }
    }

    // === Store ===

    /// Positions of every touched cell (including emptied ones), in store
    /// order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells.keys().copied()
    }

    /// Cells holding an expression, in store order
    pub fn formulas(&self) -> impl Iterator<Item = (Position, &FormulaExpr)> + '_ {
        self.cells
            .iter()
            .filter_map(|(pos, expr)| expr.as_ref().map(|expr| (*pos, expr)))
    }

    /// Number of touched cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if no cell was ever touched
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Remove every cell
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub(crate) fn insert(&mut self, pos: Position, expr: Option<FormulaExpr>) {
        self.cells.insert(pos, expr);
    }

    // === Persistence ===

    /// Replace the contents with a stream written by [`save`](Self::save)
    ///
    /// On any error the spreadsheet is left unchanged.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<()> {
        *self = StreamReader::read(reader, &StreamOptions::default())?;
        Ok(())
    }

    /// Replace the contents with a saved file
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        *self = StreamReader::read_file(path, &StreamOptions::default())?;
        Ok(())
    }

    /// Write every non-empty cell to a stream
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        StreamWriter::write(self, writer, &StreamOptions::default())
    }

    /// Write every non-empty cell to a file
    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        StreamWriter::write_file(self, path, &StreamOptions::default())
    }
}
