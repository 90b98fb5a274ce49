use std::borrow::Cow;
use std::sync::Arc;

#[cfg(feature = "bz2")]
use super::codec::Bz2Codec;
#[cfg(feature = "zlib")]
use super::codec::ZlibCodec;
use super::codec::{
    BytesRepresentation, BytesToBytesCodecTraits, CodecError, CodecOptions, Fletcher32Codec,
    InvalidBytesLengthError, ShuffleCodec,
};
use super::{Complib, Filters};

/// An ordered chain of bytes to bytes codecs applied to every chunk.
///
/// Encoding applies the codecs in order, decoding applies them in reverse.
/// A pipeline built from [`Filters`] shuffles, then compresses, then appends a checksum.
#[derive(Clone, Debug, Default)]
pub struct FilterPipeline {
    codecs: Vec<Arc<dyn BytesToBytesCodecTraits>>,
}

impl FilterPipeline {
    /// Create a pipeline from an explicit codec sequence.
    #[must_use]
    pub fn new(codecs: Vec<Arc<dyn BytesToBytesCodecTraits>>) -> Self {
        Self { codecs }
    }

    /// Create the pipeline for `filters` with elements of `item_size` bytes.
    ///
    /// The shuffle interleaves bytes with a stride of `item_size`, so it is omitted for single byte items.
    /// `filters` are expected to be resolved with [`Filters::resolve`].
    /// A compression library that is still unavailable disables compression.
    #[must_use]
    pub fn from_filters(filters: &Filters, item_size: usize) -> Self {
        let mut codecs: Vec<Arc<dyn BytesToBytesCodecTraits>> = Vec::new();
        if filters.shuffle() && item_size > 1 {
            codecs.push(Arc::new(ShuffleCodec::new(item_size)));
        }
        if filters.is_compressed() {
            match filters.complib() {
                #[cfg(feature = "zlib")]
                Complib::Zlib => codecs.push(Arc::new(ZlibCodec::new(filters.complevel()))),
                #[cfg(feature = "bz2")]
                Complib::Bzip2 => codecs.push(Arc::new(Bz2Codec::new(filters.complevel()))),
                complib => {
                    log::warn!("the {complib} compression library is not available, chunks are not compressed");
                }
            }
        }
        if filters.fletcher32() {
            codecs.push(Arc::new(Fletcher32Codec::new()));
        }
        Self { codecs }
    }

    /// Return the codecs in encoding order.
    #[must_use]
    pub fn codecs(&self) -> &[Arc<dyn BytesToBytesCodecTraits>] {
        &self.codecs
    }

    /// Return the codec names in encoding order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.codecs.iter().map(|codec| codec.name()).collect()
    }

    /// Return the encoded representation of `raw_length` raw bytes.
    #[must_use]
    pub fn encoded_representation(&self, raw_length: u64) -> BytesRepresentation {
        self.codecs.iter().fold(
            BytesRepresentation::FixedSize(raw_length),
            |representation, codec| codec.encoded_representation(&representation),
        )
    }

    /// Encode raw chunk bytes.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if a codec fails.
    pub fn encode(&self, raw: &[u8], options: &CodecOptions) -> Result<Vec<u8>, CodecError> {
        let mut value = Cow::Borrowed(raw);
        for codec in &self.codecs {
            value = codec.encode(value, options)?;
        }
        Ok(value.into_owned())
    }

    /// Decode stored chunk bytes that are expected to hold `expected_raw_length` raw bytes.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if a codec fails, a checksum does not match, or the decoded length is not `expected_raw_length`.
    pub fn decode(
        &self,
        stored: &[u8],
        expected_raw_length: usize,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let mut representations = Vec::with_capacity(self.codecs.len());
        let mut representation = BytesRepresentation::FixedSize(expected_raw_length as u64);
        for codec in &self.codecs {
            representations.push(representation);
            representation = codec.encoded_representation(&representation);
        }

        let mut value = Cow::Borrowed(stored);
        for (codec, representation) in self.codecs.iter().zip(&representations).rev() {
            value = codec.decode(value, representation, options)?;
        }
        if value.len() == expected_raw_length {
            Ok(value.into_owned())
        } else {
            Err(InvalidBytesLengthError::new(value.len(), expected_raw_length).into())
        }
    }
}
