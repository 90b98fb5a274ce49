//! The `bzip2` bytes to bytes codec.
//!
//! Compresses a chunk with the bzip2 format.
//!
//! This codec requires the `bz2` feature, which is enabled by default.
//! Without it, a `bzip2` compression library request falls back to `zlib`.

mod bz2_codec;

pub use bz2_codec::Bz2Codec;
