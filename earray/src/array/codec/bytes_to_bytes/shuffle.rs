//! The `shuffle` bytes to bytes codec.
//!
//! Splits each element into its bytes and groups bytes of equal significance together.
//! The first byte of every element is stored first, then the second byte of every element, and so on.
//! Shuffling typically improves the compression ratio of numeric data.

mod shuffle_codec;

pub use shuffle_codec::ShuffleCodec;

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use crate::array::codec::{BytesRepresentation, BytesToBytesCodecTraits, CodecOptions};

    #[test]
    fn codec_shuffle_round_trip() {
        let elements: Vec<u16> = (0..32).collect();
        let bytes = bytemuck::cast_slice::<u16, u8>(&elements).to_vec();
        let bytes_representation = BytesRepresentation::FixedSize(bytes.len() as u64);

        let codec = ShuffleCodec::new(2);
        let encoded = codec
            .encode(Cow::Borrowed(&bytes), &CodecOptions::default())
            .unwrap();
        assert_ne!(bytes, encoded.to_vec());
        let decoded = codec
            .decode(encoded, &bytes_representation, &CodecOptions::default())
            .unwrap();
        assert_eq!(bytes, decoded.to_vec());
    }

    #[test]
    fn codec_shuffle_layout() {
        let bytes: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let codec = ShuffleCodec::new(4);
        let encoded = codec
            .encode(Cow::Borrowed(&bytes), &CodecOptions::default())
            .unwrap();
        assert_eq!(encoded.to_vec(), vec![1, 5, 9, 2, 6, 10, 3, 7, 11, 4, 8, 12]);
    }

    #[test]
    fn codec_shuffle_invalid_length() {
        let codec = ShuffleCodec::new(4);
        assert!(
            codec
                .encode(Cow::Owned(vec![0; 6]), &CodecOptions::default())
                .is_err()
        );
        assert!(
            codec
                .decode(
                    Cow::Owned(vec![0; 6]),
                    &BytesRepresentation::FixedSize(6),
                    &CodecOptions::default()
                )
                .is_err()
        );
    }
}
