use std::borrow::Cow;
use std::sync::Arc;

use crate::array::codec::{
    BytesRepresentation, BytesToBytesCodecTraits, CodecError, CodecOptions, RawBytes,
};

const CHECKSUM_SIZE: usize = size_of::<u32>();

/// The number of 16-bit words summed before the running sums are folded.
const BLOCK_WORDS: usize = 360;

/// Compute the HDF5 fletcher32 checksum of `data`.
///
/// Words are read big-endian. A trailing odd byte is treated as the high byte of a final word.
#[must_use]
pub fn fletcher32(data: &[u8]) -> u32 {
    fn fold(sum: u32) -> u32 {
        (sum & 0xffff) + (sum >> 16)
    }

    let mut sum1: u32 = 0;
    let mut sum2: u32 = 0;
    let words = data.chunks_exact(2);
    let remainder = words.remainder();
    let words: Vec<&[u8]> = words.collect();
    for block in words.chunks(BLOCK_WORDS) {
        for word in block {
            sum1 = sum1.wrapping_add((u32::from(word[0]) << 8) | u32::from(word[1]));
            sum2 = sum2.wrapping_add(sum1);
        }
        sum1 = fold(sum1);
        sum2 = fold(sum2);
    }
    if let [last] = remainder {
        sum1 = sum1.wrapping_add(u32::from(*last) << 8);
        sum2 = sum2.wrapping_add(sum1);
        sum1 = fold(sum1);
        sum2 = fold(sum2);
    }
    sum1 = fold(sum1);
    sum2 = fold(sum2);
    (sum2 << 16) | sum1
}

/// A `fletcher32` codec implementation.
#[derive(Clone, Debug, Default)]
pub struct Fletcher32Codec;

impl Fletcher32Codec {
    /// Create a new `fletcher32` codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BytesToBytesCodecTraits for Fletcher32Codec {
    fn name(&self) -> &'static str {
        "fletcher32"
    }

    fn into_dyn(self: Arc<Self>) -> Arc<dyn BytesToBytesCodecTraits> {
        self as Arc<dyn BytesToBytesCodecTraits>
    }

    fn encoded_representation(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        match decoded_representation {
            BytesRepresentation::FixedSize(size) => {
                BytesRepresentation::FixedSize(size + CHECKSUM_SIZE as u64)
            }
            BytesRepresentation::BoundedSize(size) => {
                BytesRepresentation::BoundedSize(size + CHECKSUM_SIZE as u64)
            }
            BytesRepresentation::UnboundedSize => BytesRepresentation::UnboundedSize,
        }
    }

    fn encode<'a>(
        &self,
        decoded_value: RawBytes<'a>,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        let checksum = fletcher32(&decoded_value).to_le_bytes();
        let mut encoded_value: Vec<u8> = Vec::with_capacity(decoded_value.len() + checksum.len());
        encoded_value.extend_from_slice(&decoded_value);
        encoded_value.extend_from_slice(&checksum);
        Ok(Cow::Owned(encoded_value))
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        _decoded_representation: &BytesRepresentation,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        let Some(data_len) = encoded_value.len().checked_sub(CHECKSUM_SIZE) else {
            return Err(CodecError::TruncatedEncodedValue(
                encoded_value.len(),
                "fletcher32",
            ));
        };
        let (data, checksum_stored) = encoded_value.split_at(data_len);
        if fletcher32(data).to_le_bytes() != checksum_stored {
            return Err(CodecError::InvalidChecksum);
        }
        match encoded_value {
            Cow::Borrowed(encoded_value) => Ok(Cow::Borrowed(&encoded_value[..data_len])),
            Cow::Owned(mut encoded_value) => {
                encoded_value.truncate(data_len);
                Ok(Cow::Owned(encoded_value))
            }
        }
    }
}
