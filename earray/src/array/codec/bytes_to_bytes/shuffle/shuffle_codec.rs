use std::borrow::Cow;
use std::sync::Arc;

use crate::array::codec::{
    BytesRepresentation, BytesToBytesCodecTraits, CodecError, CodecOptions, RawBytes,
};

/// A `shuffle` codec implementation.
#[derive(Clone, Debug)]
pub struct ShuffleCodec {
    elementsize: usize,
}

impl ShuffleCodec {
    /// Create a new `shuffle` codec for elements of `elementsize` bytes.
    ///
    /// An `elementsize` of zero is treated as one.
    #[must_use]
    pub fn new(elementsize: usize) -> Self {
        Self {
            elementsize: elementsize.max(1),
        }
    }

    /// Return the element size.
    #[must_use]
    pub const fn elementsize(&self) -> usize {
        self.elementsize
    }

    fn check_length(&self, len: usize) -> Result<(), CodecError> {
        if len.is_multiple_of(self.elementsize) {
            Ok(())
        } else {
            Err(CodecError::Other(format!(
                "the shuffle codec expects the input byte length {len} to be an integer multiple of the elementsize {}",
                self.elementsize
            )))
        }
    }
}

impl BytesToBytesCodecTraits for ShuffleCodec {
    fn name(&self) -> &'static str {
        "shuffle"
    }

    fn into_dyn(self: Arc<Self>) -> Arc<dyn BytesToBytesCodecTraits> {
        self as Arc<dyn BytesToBytesCodecTraits>
    }

    fn encoded_representation(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        *decoded_representation
    }

    fn encode<'a>(
        &self,
        decoded_value: RawBytes<'a>,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        self.check_length(decoded_value.len())?;
        if self.elementsize == 1 {
            return Ok(decoded_value);
        }

        let mut encoded_value = vec![0; decoded_value.len()];
        let count = decoded_value.len() / self.elementsize;
        for (i, element) in decoded_value.chunks_exact(self.elementsize).enumerate() {
            for (byte_index, byte) in element.iter().enumerate() {
                encoded_value[byte_index * count + i] = *byte;
            }
        }
        Ok(Cow::Owned(encoded_value))
    }

    fn decode<'a>(
        &self,
        encoded_value: RawBytes<'a>,
        _decoded_representation: &BytesRepresentation,
        _options: &CodecOptions,
    ) -> Result<RawBytes<'a>, CodecError> {
        self.check_length(encoded_value.len())?;
        if self.elementsize == 1 {
            return Ok(encoded_value);
        }

        let mut decoded_value = vec![0; encoded_value.len()];
        let count = encoded_value.len() / self.elementsize;
        for (byte_index, plane) in encoded_value.chunks_exact(count.max(1)).enumerate() {
            for (i, byte) in plane.iter().enumerate() {
                decoded_value[i * self.elementsize + byte_index] = *byte;
            }
        }
        Ok(Cow::Owned(decoded_value))
    }
}
