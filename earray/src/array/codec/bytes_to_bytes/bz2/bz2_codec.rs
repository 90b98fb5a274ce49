use std::borrow::Cow;
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::array::codec::{
    BytesRepresentation, BytesToBytesCodecTraits, CodecError, CodecOptions, RawBytes,
};

/// A `bzip2` codec implementation.
#[derive(Clone, Debug)]
pub struct Bz2Codec {
    compression: bzip2::Compression,
}

impl Bz2Codec {
    /// Create a new `bzip2` codec.
    ///
    /// The level is clamped to the block sizes supported by bzip2 (1 to 9).
    #[must_use]
    pub fn new(level: u8) -> Self {
        let compression = bzip2::Compression::new(u32::from(level.clamp(1, 9)));
        Self { compression }
    }

    /// Return the compression level.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.compression.level()
    }
}

impl BytesToBytesCodecTraits for Bz2Codec {
    fn name(&self) -> &'static str {
        "bzip2"
    }

    fn into_dyn(self: Arc<Self>) -> Arc<dyn BytesToBytesCodecTraits> {
        self as Arc<dyn BytesToBytesCodecTraits>
    }

    fn encoded_representation(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        decoded_representation
            .size()
            .map_or(BytesRepresentation::UnboundedSize, |size| {
                // via https://github.com/amd/aocl-compression/blob/AOCL-Sep2025-b2/algos/bzip2/bzlib.c#L110-L122
                const MIN_PAD_SIZE: u64 = 1024;
                BytesRepresentation::BoundedSize(size + (size / 8) + MIN_PAD_SIZE)
            })
    }

    fn encode<'a>(
        &self,
        decoded_value: RawBytes<'a>,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        let mut encoder = bzip2::read::BzEncoder::new(Cursor::new(decoded_value), self.compression);
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(Cow::Owned(out))
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        _decoded_representation: &BytesRepresentation,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        let mut decoder = bzip2::read::BzDecoder::new(Cursor::new(encoded_value));
        let mut out: Vec<u8> = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(Cow::Owned(out))
    }
}
