//! The chunk codec API for the [`earray`](https://docs.rs/earray/latest/earray/index.html) crate.
//!
//! Every chunk of an extensible array passes through an ordered chain of bytes to bytes codecs before it is stored.
//! This crate defines the codec traits, the codec error type, and the options that control encoding and decoding.
//! The codecs themselves (shuffle, zlib, bzip2, fletcher32) live in the `earray` crate.
//!
//! ## Licence
//! `earray_codec` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

mod options;

mod bytes_representation;
pub use bytes_representation::BytesRepresentation;

pub use options::CodecOptions;

use derive_more::derive::Display;
use thiserror::Error;

use std::borrow::Cow;
use std::sync::Arc;

/// Raw chunk bytes, borrowed or owned.
pub type RawBytes<'a> = Cow<'a, [u8]>;

/// Traits for bytes to bytes codecs.
///
/// A bytes to bytes codec is reversible: decoding the output of [`encode`](BytesToBytesCodecTraits::encode) must reproduce its input exactly.
pub trait BytesToBytesCodecTraits: core::fmt::Debug + Send + Sync {
    /// The codec name, e.g. `zlib`.
    fn name(&self) -> &'static str;

    /// Return a dynamic version of the codec.
    fn into_dyn(self: Arc<Self>) -> Arc<dyn BytesToBytesCodecTraits>;

    /// Returns the size of the encoded representation given a size of the decoded representation.
    fn encoded_representation(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation;

    /// Encode chunk bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    fn encode<'a>(
        &self,
        decoded_value: RawBytes<'a>,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError>;

    /// Decode chunk bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        decoded_representation: &BytesRepresentation,
        options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError>;
}

/// An error indicating the length of bytes does not match the expected length.
#[derive(Clone, Debug, Display, Error)]
#[display("Invalid bytes len {len}, expected {expected_len}")]
pub struct InvalidBytesLengthError {
    len: usize,
    expected_len: usize,
}

impl InvalidBytesLengthError {
    /// Create a new [`InvalidBytesLengthError`].
    #[must_use]
    pub fn new(len: usize, expected_len: usize) -> Self {
        Self { len, expected_len }
    }
}

/// A codec error.
#[non_exhaustive]
#[derive(Clone, Debug, Error)]
pub enum CodecError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] Arc<std::io::Error>),
    /// The decoded size of a chunk did not match what was expected.
    #[error("the size of a decoded chunk is {}, expected {}", _0.len, _0.expected_len)]
    UnexpectedChunkDecodedSize(#[from] InvalidBytesLengthError),
    /// An embedded checksum does not match the decoded value.
    #[error("the checksum is invalid")]
    InvalidChecksum,
    /// The encoded value is too short to hold the codec's framing.
    #[error("encoded value of {_0} bytes is too short for codec {_1}")]
    TruncatedEncodedValue(usize, &'static str),
    /// Other
    #[error("{_0}")]
    Other(String),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(Arc::new(err))
    }
}

impl From<&str> for CodecError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for CodecError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_options() {
        let options = CodecOptions::default();
        assert!(options.concurrent_target() >= 1);
        assert_eq!(options.with_concurrent_target(0).concurrent_target(), 1);
        let mut options = options;
        options.set_concurrent_target(6);
        assert_eq!(options.concurrent_target(), 6);
    }

    #[test]
    fn codec_error_display() {
        let err = CodecError::from(InvalidBytesLengthError::new(3, 8));
        assert_eq!(err.to_string(), "the size of a decoded chunk is 3, expected 8");
        assert_eq!(
            CodecError::TruncatedEncodedValue(2, "fletcher32").to_string(),
            "encoded value of 2 bytes is too short for codec fletcher32"
        );
        assert_eq!(BytesRepresentation::BoundedSize(10).size(), Some(10));
        assert_eq!(BytesRepresentation::UnboundedSize.size(), None);
    }
}
