//! Persisted stream codec
//!
//! A spreadsheet is saved as a sequence of records, each terminated by the
//! delimiter byte (`|` by default):
//!
//! ```text
//! <col> <row> =<formula>|...|0 0 <checksum>|
//! ```
//!
//! One record is written per non-empty cell in position order. The final
//! `0 0` record carries an FNV-1a 64-bit checksum over the concatenation of
//! every record's formula text, column and row (decimal), in stream order.
//! A delimiter inside a double-quoted string literal does not end a record.

mod options;
mod reader;
mod writer;

pub use options::StreamOptions;
pub use reader::StreamReader;
pub use writer::StreamWriter;

/// FNV-1a 64-bit hasher (stable across runs and platforms)
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checksum(u64);

impl Checksum {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    pub(crate) fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub(crate) fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= u64::from(b);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    /// Feed one record's contribution: formula text, column, row
    pub(crate) fn update_record(&mut self, formula: &str, col: u32, row: u32) {
        self.update(formula.as_bytes());
        self.update(col.to_string().as_bytes());
        self.update(row.to_string().as_bytes());
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

/// Split a byte stream into delimiter-terminated records
///
/// The last record may omit its terminator. Delimiters between double
/// quotes are part of the record; a doubled quote toggles twice and so
/// keeps the string open.
pub(crate) struct RecordSplitter<'a> {
    input: &'a [u8],
    delimiter: u8,
}

impl<'a> RecordSplitter<'a> {
    pub(crate) fn new(input: &'a [u8], delimiter: u8) -> Self {
        Self { input, delimiter }
    }
}

impl<'a> Iterator for RecordSplitter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.input.is_empty() {
            return None;
        }

        let mut in_quotes = false;
        let end = self.input.iter().position(|&b| {
            if b == b'"' {
                in_quotes = !in_quotes;
            }
            b == self.delimiter && !in_quotes
        });

        let (record, rest) = match end {
            Some(end) => (&self.input[..end], &self.input[end + 1..]),
            None => (self.input, &self.input[self.input.len()..]),
        };
        self.input = rest;
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn split(input: &str) -> Vec<&str> {
        RecordSplitter::new(input.as_bytes(), b'|')
            .map(|r| std::str::from_utf8(r).unwrap())
            .collect()
    }

    #[test]
    fn test_checksum_known_values() {
        assert_eq!(Checksum::new().finish(), 0xcbf29ce484222325);

        let mut h = Checksum::new();
        h.update(b"a");
        assert_eq!(h.finish(), 0xaf63dc4c8601ec8c);

        let mut h = Checksum::new();
        h.update(b"foobar");
        assert_eq!(h.finish(), 0x85944171f73967e8);
    }

    #[test]
    fn test_checksum_is_incremental() {
        let mut whole = Checksum::new();
        whole.update(b"=1.0000000000000000e0");
        whole.update(b"12");

        let mut parts = Checksum::new();
        parts.update_record("=1.0000000000000000e0", 1, 2);

        assert_eq!(whole.finish(), parts.finish());
    }

    #[test]
    fn test_split_records() {
        assert_eq!(split("1 1 =A2|0 0 5|"), ["1 1 =A2", "0 0 5"]);
        assert_eq!(split("0 0 5"), ["0 0 5"]);
        assert_eq!(split("0 0 5|\n"), ["0 0 5", "\n"]);
        assert_eq!(split("||"), ["", ""]);
        assert!(split("").is_empty());
    }

    #[test]
    fn test_split_respects_quotes() {
        assert_eq!(
            split("1 1 =\"a|b\"|1 2 =\"say \"\"|\"\"\"|0 0 1|"),
            ["1 1 =\"a|b\"", "1 2 =\"say \"\"|\"\"\"", "0 0 1"]
        );
    }
}
