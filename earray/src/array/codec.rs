//! Chunk codecs.
//!
//! Every chunk is passed through a [`FilterPipeline`](crate::array::FilterPipeline) of bytes to bytes codecs before it reaches the store.
//! The pipeline is built from the [`Filters`](crate::array::Filters) recorded when the array was created:
//!  - [`ShuffleCodec`] interleaves the bytes of each element by significance,
//!  - [`ZlibCodec`] or [`Bz2Codec`] compress the chunk, and
//!  - [`Fletcher32Codec`] appends a checksum that is verified on decode.
//!
//! The codec traits and options are defined in the [`earray_codec`] crate and re-exported here.

pub mod bytes_to_bytes;

#[cfg(feature = "bz2")]
pub use bytes_to_bytes::bz2::*;
pub use bytes_to_bytes::fletcher32::*;
pub use bytes_to_bytes::shuffle::*;
#[cfg(feature = "zlib")]
pub use bytes_to_bytes::zlib::*;

pub use earray_codec::{
    BytesRepresentation, BytesToBytesCodecTraits, CodecError, CodecOptions,
    InvalidBytesLengthError, RawBytes,
};
