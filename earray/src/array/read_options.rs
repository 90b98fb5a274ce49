//! Options for reading and iterating.

use super::codec::CodecOptions;

/// The default size in bytes of the row buffer of iteration and copy.
pub const DEFAULT_BUFFER_BYTES: u64 = 1024 * 1024;

/// Options for reading, iterating and copying an earray.
///
/// The default values are:
/// - `buffer_rows`: derived from a 1 MiB buffer and the row size of the array
/// - `codec_options`: [`CodecOptions::default`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    buffer_rows: Option<u64>,
    codec_options: CodecOptions,
}

impl ReadOptions {
    /// Return the explicit buffer size in rows, if set.
    #[must_use]
    pub const fn buffer_rows(&self) -> Option<u64> {
        self.buffer_rows
    }

    /// Set the number of rows fetched at a time by iteration and copy.
    ///
    /// A buffer of zero rows is treated as one.
    pub fn set_buffer_rows(&mut self, buffer_rows: u64) -> &mut Self {
        self.buffer_rows = Some(buffer_rows.max(1));
        self
    }

    /// Set the number of rows fetched at a time by iteration and copy.
    ///
    /// A buffer of zero rows is treated as one.
    #[must_use]
    pub fn with_buffer_rows(mut self, buffer_rows: u64) -> Self {
        self.buffer_rows = Some(buffer_rows.max(1));
        self
    }

    /// Return the buffer size in rows for an array with rows of `row_bytes` bytes.
    #[must_use]
    pub fn effective_buffer_rows(&self, row_bytes: u64) -> u64 {
        self.buffer_rows
            .unwrap_or_else(|| (DEFAULT_BUFFER_BYTES / row_bytes.max(1)).max(1))
    }

    /// Return the codec options.
    #[must_use]
    pub const fn codec_options(&self) -> &CodecOptions {
        &self.codec_options
    }

    /// Set the codec options.
    pub fn set_codec_options(&mut self, codec_options: CodecOptions) -> &mut Self {
        self.codec_options = codec_options;
        self
    }

    /// Set the codec options.
    #[must_use]
    pub fn with_codec_options(mut self, codec_options: CodecOptions) -> Self {
        self.codec_options = codec_options;
        self
    }
}

impl From<CodecOptions> for ReadOptions {
    fn from(codec_options: CodecOptions) -> Self {
        Self::default().with_codec_options(codec_options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_options_buffer_rows() {
        let options = ReadOptions::default();
        assert_eq!(options.buffer_rows(), None);
        assert_eq!(options.effective_buffer_rows(8), 131_072);
        assert_eq!(options.effective_buffer_rows(4 * 1024 * 1024), 1);
        assert_eq!(options.effective_buffer_rows(0), 1024 * 1024);
        let options = options.with_buffer_rows(0);
        assert_eq!(options.effective_buffer_rows(8), 1);
        assert!(options.codec_options().concurrent_target() >= 1);
    }
}
