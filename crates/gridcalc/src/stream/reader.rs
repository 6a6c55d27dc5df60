//! Stream reader

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use super::{Checksum, RecordSplitter, StreamOptions};
use crate::error::{Result, SpreadsheetError};
use crate::spreadsheet::Spreadsheet;
use gridcalc_core::Position;
use gridcalc_formula::parse_formula;

/// Persisted stream reader
pub struct StreamReader;

impl StreamReader {
    /// Read a spreadsheet from a file
    pub fn read_file<P: AsRef<Path>>(path: P, options: &StreamOptions) -> Result<Spreadsheet> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file), options)
    }

    /// Read a spreadsheet from a reader
    ///
    /// The whole stream must be valid: every record well formed, every
    /// formula parseable, the checksum record present and matching, and
    /// nothing after it.
    pub fn read<R: Read>(mut reader: R, options: &StreamOptions) -> Result<Spreadsheet> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        let result = Self::parse(&bytes, options.delimiter);
        match &result {
            Ok(sheet) => log::debug!("loaded {} records", sheet.len()),
            Err(e) => log::debug!("rejected stream: {}", e),
        }
        result
    }

    fn parse(bytes: &[u8], delimiter: u8) -> Result<Spreadsheet> {
        let mut sheet = Spreadsheet::new();
        let mut checksum = Checksum::new();
        let mut records = RecordSplitter::new(bytes, delimiter);
        let mut index = 0usize;

        loop {
            index += 1;
            let raw = records
                .next()
                .ok_or_else(|| SpreadsheetError::load_format(index, "missing checksum record"))?;
            let text = std::str::from_utf8(raw)
                .map_err(|_| SpreadsheetError::load_format(index, "record is not valid UTF-8"))?;

            match Record::parse(text).map_err(|m| SpreadsheetError::load_format(index, m))? {
                Record::Cell { pos, formula } => {
                    let expr = parse_formula(formula)
                        .map_err(|e| SpreadsheetError::load_format(index, e.to_string()))?;
                    checksum.update_record(formula, pos.col, pos.row);
                    sheet.insert(pos, Some(expr));
                }
                Record::Checksum(expected) => {
                    let actual = checksum.finish();
                    if expected != actual {
                        return Err(SpreadsheetError::ChecksumMismatch { expected, actual });
                    }
                    if records.next().is_some() {
                        return Err(SpreadsheetError::load_format(
                            index + 1,
                            "unexpected data after checksum record",
                        ));
                    }
                    return Ok(sheet);
                }
            }
        }
    }
}

/// One decoded record
#[derive(Debug, PartialEq)]
enum Record<'a> {
    Cell { pos: Position, formula: &'a str },
    Checksum(u64),
}

impl<'a> Record<'a> {
    fn parse(text: &'a str) -> std::result::Result<Self, String> {
        let mut fields = text.splitn(3, ' ');
        let col: u32 = parse_decimal(fields.next(), "column")?;
        let row: u32 = parse_decimal(fields.next(), "row")?;
        let rest = fields.next().ok_or("missing formula")?;

        if col == 0 {
            if row != 0 {
                return Err(format!("column 0 is not a cell position (row {})", row));
            }
            return parse_decimal(Some(rest), "checksum").map(Record::Checksum);
        }

        if !rest.starts_with('=') {
            return Err(format!("formula must start with '=': {:?}", rest));
        }

        Ok(Record::Cell {
            pos: Position::new(col, row),
            formula: rest,
        })
    }
}

/// Parse an unsigned decimal field (digits only, no sign, no leading zero)
fn parse_decimal<T: FromStr>(field: Option<&str>, what: &str) -> std::result::Result<T, String> {
    let field = field.ok_or_else(|| format!("missing {}", what))?;
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid {} {:?}", what, field));
    }
    if field.len() > 1 && field.starts_with('0') {
        return Err(format!("{} has a leading zero: {:?}", what, field));
    }
    field
        .parse()
        .map_err(|_| format!("{} out of range: {}", what, field))
}
