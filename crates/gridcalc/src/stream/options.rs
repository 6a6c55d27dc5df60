//! Stream options

/// Options for saving and loading the persisted stream
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Record terminator (default: `|`)
    ///
    /// Must not be `"` or a byte that can appear in a record header
    /// (digits or space); such streams cannot be read back.
    pub delimiter: u8,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self { delimiter: b'|' }
    }
}

impl StreamOptions {
    /// Use a different record terminator
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}
