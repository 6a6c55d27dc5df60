//! Grid position type and its `A1`-style text codec

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A cell position (e.g., "A1", "AB12")
///
/// Columns are 1-based and encoded as bijective base-26 letters (`A` = 1,
/// `Z` = 26, `AA` = 27). Rows are the decimal number written after the
/// letters. Positions order by column first, then by row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Column index (1-based, A=1, B=2, ..., Z=26, AA=27)
    pub col: u32,
    /// Row number as written in the address
    pub row: u32,
}

impl Position {
    /// Create a position from column and row numbers
    ///
    /// No check is made; column 0 has no A1 form and names no cell. Use
    /// [`try_new`](Self::try_new) for numbers from outside.
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// Create a position, rejecting column 0
    pub fn try_new(col: u32, row: u32) -> Result<Self> {
        let pos = Self { col, row };
        pos.validate()?;
        Ok(pos)
    }

    /// Check if the position names a cell on the grid
    pub fn is_valid(&self) -> bool {
        self.col >= 1
    }

    /// Fail unless the position names a cell on the grid
    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::InvalidPosition(format!(
                "column 0 is not on the grid (row {})",
                self.row
            )))
        }
    }

    /// Parse a position from A1-style notation
    ///
    /// Only uppercase column letters are accepted and the row may not carry a
    /// leading zero (a lone `0` is allowed).
    ///
    /// # Examples
    /// ```
    /// use gridcalc_core::Position;
    ///
    /// let pos = Position::parse("A1").unwrap();
    /// assert_eq!(pos.col, 1);
    /// assert_eq!(pos.row, 1);
    ///
    /// assert!(Position::parse("A01").is_err());
    /// assert!(Position::parse("a1").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();

        let letters_end = bytes
            .iter()
            .position(|b| !b.is_ascii_uppercase())
            .unwrap_or(bytes.len());
        if letters_end == 0 {
            return Err(Error::InvalidPosition(format!(
                "no column letters in '{}'",
                s
            )));
        }

        let digits = &s[letters_end..];
        if digits.is_empty() {
            return Err(Error::InvalidPosition(format!("no row number in '{}'", s)));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidPosition(format!(
                "invalid row number in '{}'",
                s
            )));
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(Error::InvalidPosition(format!(
                "row number has a leading zero in '{}'",
                s
            )));
        }

        let col = Self::letters_to_column(&s[..letters_end])?;
        let row = digits
            .parse::<u32>()
            .map_err(|_| Error::InvalidPosition(format!("row number too large in '{}'", s)))?;

        Ok(Self { col, row })
    }

    /// Convert a column number to letters (1 = A, 26 = Z, 27 = AA, etc.)
    ///
    /// Column 0 has no letter form and yields an empty string.
    pub fn column_to_letters(col: u32) -> String {
        let mut letters = Vec::new();
        let mut n = col;

        while n > 0 {
            n -= 1;
            letters.push(b'A' + (n % 26) as u8);
            n /= 26;
        }

        letters.iter().rev().map(|&b| b as char).collect()
    }

    /// Convert column letters to a column number (A = 1, Z = 26, AA = 27, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::InvalidPosition("empty column letters".into()));
        }

        let mut col: u32 = 0;
        for c in letters.bytes() {
            if !c.is_ascii_uppercase() {
                return Err(Error::InvalidPosition(format!(
                    "invalid column letter '{}'",
                    c as char
                )));
            }
            col = col
                .checked_mul(26)
                .and_then(|v| v.checked_add(u32::from(c - b'A') + 1))
                .ok_or_else(|| Error::InvalidPosition(format!("column too large: {}", letters)))?;
        }

        Ok(col)
    }

    /// Move the position by a signed offset
    ///
    /// Returns `None` if the result would leave the grid (column below 1 or
    /// row below 0) or overflow.
    pub fn offset(&self, d_col: i64, d_row: i64) -> Option<Position> {
        let col = i64::from(self.col).checked_add(d_col)?;
        let row = i64::from(self.row).checked_add(d_row)?;
        if col < 1 {
            return None;
        }
        Some(Position {
            col: u32::try_from(col).ok()?,
            row: u32::try_from(row).ok()?,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::column_to_letters(self.col), self.row)
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
