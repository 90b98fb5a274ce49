//! The `fletcher32` bytes to bytes codec.
//!
//! Appends a fletcher32 checksum of the input bytestream, computed over big-endian 16-bit words as HDF5 does.
//! The checksum is always verified on decode, a mismatch is a [`CodecError::InvalidChecksum`](crate::array::codec::CodecError::InvalidChecksum).

mod fletcher32_codec;

pub use fletcher32_codec::{Fletcher32Codec, fletcher32};

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use crate::array::codec::{
        BytesRepresentation, BytesToBytesCodecTraits, CodecError, CodecOptions,
    };

    #[test]
    fn fletcher32_checksum() {
        let bytes: Vec<u8> = (0..6).collect();
        assert_eq!(fletcher32(&bytes).to_le_bytes(), [9, 6, 14, 8]);
        assert_eq!(fletcher32(&[]), 0);
    }

    #[test]
    fn codec_fletcher32_round_trip() {
        let elements: Vec<u16> = (0..1000).collect();
        let bytes = bytemuck::cast_slice::<u16, u8>(&elements).to_vec();
        let bytes_representation = BytesRepresentation::FixedSize(bytes.len() as u64);

        let codec = Fletcher32Codec::new();
        let encoded = codec
            .encode(Cow::Borrowed(&bytes), &CodecOptions::default())
            .unwrap();
        assert_eq!(encoded.len(), bytes.len() + 4);
        assert_eq!(
            codec.encoded_representation(&bytes_representation),
            BytesRepresentation::FixedSize(bytes.len() as u64 + 4)
        );
        let decoded = codec
            .decode(encoded, &bytes_representation, &CodecOptions::default())
            .unwrap();
        assert_eq!(bytes, decoded.to_vec());
    }

    #[test]
    fn codec_fletcher32_odd_length() {
        let bytes: Vec<u8> = (0..7).collect();
        let codec = Fletcher32Codec::new();
        let encoded = codec
            .encode(Cow::Borrowed(&bytes), &CodecOptions::default())
            .unwrap();
        let decoded = codec
            .decode(
                encoded,
                &BytesRepresentation::FixedSize(7),
                &CodecOptions::default(),
            )
            .unwrap();
        assert_eq!(bytes, decoded.to_vec());
    }

    #[test]
    fn codec_fletcher32_corrupt() {
        let bytes: Vec<u8> = (0..64).collect();
        let bytes_representation = BytesRepresentation::FixedSize(bytes.len() as u64);
        let codec = Fletcher32Codec::new();
        let mut encoded = codec
            .encode(Cow::Borrowed(&bytes), &CodecOptions::default())
            .unwrap()
            .to_vec();
        encoded[10] ^= 0xff;

        assert!(matches!(
            codec.decode(
                Cow::Borrowed(&encoded),
                &bytes_representation,
                &CodecOptions::default()
            ),
            Err(CodecError::InvalidChecksum)
        ));

        // a corrupted trailer is detected too
        let mut encoded = codec
            .encode(Cow::Borrowed(&bytes), &CodecOptions::default())
            .unwrap()
            .to_vec();
        *encoded.last_mut().unwrap() ^= 1;
        assert!(matches!(
            codec.decode(
                Cow::Owned(encoded),
                &bytes_representation,
                &CodecOptions::default().with_concurrent_target(1)
            ),
            Err(CodecError::InvalidChecksum)
        ));
    }

    #[test]
    fn codec_fletcher32_truncated() {
        let codec = Fletcher32Codec::new();
        assert!(matches!(
            codec.decode(
                Cow::Owned(vec![1, 2, 3]),
                &BytesRepresentation::FixedSize(0),
                &CodecOptions::default()
            ),
            Err(CodecError::TruncatedEncodedValue(3, "fletcher32"))
        ));
    }
}
