//! Bytes to bytes codecs.

#[cfg(feature = "bz2")]
pub mod bz2;
pub mod fletcher32;
pub mod shuffle;
#[cfg(feature = "zlib")]
pub mod zlib;
