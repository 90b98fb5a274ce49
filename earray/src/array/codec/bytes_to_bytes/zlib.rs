//! The `zlib` bytes to bytes codec.
//!
//! Compresses a chunk with the zlib format (RFC 1950).
//!
//! This codec requires the `zlib` feature, which is enabled by default.
//! It is also the library that unavailable compression libraries fall back to.

mod zlib_codec;

pub use zlib_codec::ZlibCodec;
