//! Stream writer

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{Checksum, StreamOptions};
use crate::error::Result;
use crate::spreadsheet::Spreadsheet;

/// Persisted stream writer
pub struct StreamWriter;

impl StreamWriter {
    /// Write a spreadsheet to a file, creating or truncating it
    pub fn write_file<P: AsRef<Path>>(
        sheet: &Spreadsheet,
        path: P,
        options: &StreamOptions,
    ) -> Result<()> {
        let file = File::create(path)?;
        Self::write(sheet, BufWriter::new(file), options)
    }

    /// Write a spreadsheet to a writer
    ///
    /// Explicitly emptied cells are not written.
    pub fn write<W: Write>(sheet: &Spreadsheet, mut writer: W, options: &StreamOptions) -> Result<()> {
        let mut checksum = Checksum::new();
        let mut count = 0usize;

        for (pos, expr) in sheet.formulas() {
            let formula = format!("={}", expr);
            write!(writer, "{} {} {}", pos.col, pos.row, formula)?;
            writer.write_all(&[options.delimiter])?;

            checksum.update_record(&formula, pos.col, pos.row);
            count += 1;
        }

        write!(writer, "0 0 {}", checksum.finish())?;
        writer.write_all(&[options.delimiter])?;
        writer.flush()?;

        log::debug!("saved {} records", count);
        Ok(())
    }
}
