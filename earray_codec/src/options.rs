//! Options for encoding and decoding chunks.

/// Options for encoding and decoding chunks.
///
/// Checksums are always verified on decode and cannot be disabled.
#[derive(Debug, Clone, Copy)]
pub struct CodecOptions {
    concurrent_target: usize,
}

impl Default for CodecOptions {
    /// Encode as many chunks at once as there are Rayon threads.
    fn default() -> Self {
        Self {
            concurrent_target: rayon::current_num_threads().max(1),
        }
    }
}

impl CodecOptions {
    /// Return the maximum number of chunks an append encodes in parallel.
    #[must_use]
    pub fn concurrent_target(&self) -> usize {
        self.concurrent_target
    }

    /// Set the maximum number of chunks an append encodes in parallel. Zero means one.
    pub fn set_concurrent_target(&mut self, concurrent_target: usize) -> &mut Self {
        self.concurrent_target = concurrent_target.max(1);
        self
    }

    /// Set the maximum number of chunks an append encodes in parallel. Zero means one.
    #[must_use]
    pub fn with_concurrent_target(mut self, concurrent_target: usize) -> Self {
        self.set_concurrent_target(concurrent_target);
        self
    }
}
