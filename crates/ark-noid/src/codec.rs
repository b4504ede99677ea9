//! Minter wire format.
//!
//! A minter travels as a MessagePack body. On a byte stream each body is
//! framed by a 4-byte big-endian length prefix; [`MinterCodec`] handles the
//! framing for tokio transports.

use thiserror::Error;

use crate::minter::Minter;

/// Largest minter frame accepted by [`MinterCodec`].
pub const MAX_FRAME_LENGTH: usize = 1 << 20;

/// Errors raised while encoding or decoding a minter.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Serialization failed.
    #[error("failed to encode minter: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// The body is not a valid minter.
    #[error("failed to decode minter: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// Transport failure, including oversized frames.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize a minter to a MessagePack body (no length prefix).
pub fn encode_minter(minter: &Minter) -> Result<Vec<u8>, CodecError> {
    Ok(rmp_serde::to_vec_named(minter)?)
}

/// Deserialize a minter from a MessagePack body.
///
/// A randomized minter comes back without an open lookup file handle; it is
/// reopened on the first read.
pub fn decode_minter(bytes: &[u8]) -> Result<Minter, CodecError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

#[cfg(feature = "tokio")]
pub use self::framed::MinterCodec;

#[cfg(feature = "tokio")]
mod framed {
    use bytes::{Bytes, BytesMut};
    use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

    use super::{decode_minter, encode_minter, CodecError, MAX_FRAME_LENGTH};
    use crate::minter::Minter;

    /// Tokio codec for length-prefixed minter frames.
    ///
    /// Wraps [`LengthDelimitedCodec`] and (de)serializes each frame body.
    pub struct MinterCodec {
        inner: LengthDelimitedCodec,
    }

    impl MinterCodec {
        /// Create a codec accepting frames up to [`MAX_FRAME_LENGTH`].
        pub fn new() -> Self {
            Self::with_max_len(MAX_FRAME_LENGTH)
        }

        /// Create a codec with a custom maximum frame length.
        pub fn with_max_len(max_len: usize) -> Self {
            let inner = LengthDelimitedCodec::builder()
                .length_field_length(4)
                .big_endian()
                .max_frame_length(max_len)
                .new_codec();
            Self { inner }
        }
    }

    impl Default for MinterCodec {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Decoder for MinterCodec {
        type Item = Minter;
        type Error = CodecError;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Minter>, CodecError> {
            match self.inner.decode(src)? {
                Some(frame) => decode_minter(&frame).map(Some),
                None => Ok(None),
            }
        }
    }

    impl Encoder<&Minter> for MinterCodec {
        type Error = CodecError;

        fn encode(&mut self, minter: &Minter, dst: &mut BytesMut) -> Result<(), CodecError> {
            let body = encode_minter(minter)?;
            self.inner.encode(Bytes::from(body), dst)?;
            Ok(())
        }
    }

    impl Encoder<Minter> for MinterCodec {
        type Error = CodecError;

        fn encode(&mut self, minter: Minter, dst: &mut BytesMut) -> Result<(), CodecError> {
            Encoder::<&Minter>::encode(self, &minter, dst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::AlphabetKind;
    use crate::minter::{MinterConfig, RandomizedMinter, SequentialMinter};
    use crate::naf::LookupSettings;

    fn sequential() -> Minter {
        let config = MinterConfig::new("test", AlphabetKind::Alphanumeric, 4)
            .with_shoulder(Some("b5".to_string()));
        SequentialMinter::new(config).unwrap().into()
    }

    #[test]
    fn test_identical_minters_encode_identically() {
        let mut a = sequential();
        let mut b = sequential();
        a.next_batch(26).unwrap();
        b.next_batch(26).unwrap();
        assert_eq!(encode_minter(&a).unwrap(), encode_minter(&b).unwrap());

        b.next_noid().unwrap();
        assert_ne!(encode_minter(&a).unwrap(), encode_minter(&b).unwrap());
    }

    #[test]
    fn test_decoded_sequential_resumes() {
        let mut original = sequential();
        original.next_batch(40).unwrap();

        let mut resumed = decode_minter(&encode_minter(&original).unwrap()).unwrap();
        assert_eq!(resumed.emitted(), 40);
        assert_eq!(
            resumed.next_batch(5).unwrap(),
            original.next_batch(5).unwrap()
        );
    }

    #[test]
    fn test_decoded_randomized_reopens_lookup_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LookupSettings::new(dir.path());
        let config = MinterConfig::new("test", AlphabetKind::Numeric, 3).with_checksums(false);
        let mut original: Minter = RandomizedMinter::new(config, &settings).unwrap().into();
        original.next_batch(10).unwrap();

        let mut resumed = decode_minter(&encode_minter(&original).unwrap()).unwrap();
        assert!(resumed.is_randomized());
        assert_eq!(resumed.to_string(), original.to_string());
        assert_eq!(
            resumed.next_batch(100).unwrap(),
            original.next_batch(100).unwrap()
        );
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            decode_minter(b"\xc1\xc1\xc1"),
            Err(CodecError::Decode(_))
        ));
    }

    #[cfg(feature = "tokio")]
    mod framed {
        use super::*;
        use bytes::BytesMut;
        use tokio_util::codec::{Decoder, Encoder};

        #[test]
        fn test_frame_has_big_endian_length_prefix() {
            let minter = sequential();
            let body = encode_minter(&minter).unwrap();

            let mut buf = BytesMut::new();
            MinterCodec::new().encode(&minter, &mut buf).unwrap();

            assert_eq!(&buf[..4], &(body.len() as u32).to_be_bytes());
            assert_eq!(&buf[4..], &body[..]);
        }

        #[test]
        fn test_partial_frame_waits_for_more() {
            let mut minter = sequential();
            minter.next_batch(3).unwrap();

            let mut encoded = BytesMut::new();
            let mut codec = MinterCodec::new();
            codec.encode(&minter, &mut encoded).unwrap();

            let tail = encoded.split_off(encoded.len() / 2);
            assert!(codec.decode(&mut encoded).unwrap().is_none());

            encoded.unsplit(tail);
            let decoded = codec.decode(&mut encoded).unwrap().unwrap();
            assert_eq!(decoded.emitted(), 3);
            assert!(encoded.is_empty());
        }

        #[test]
        fn test_oversized_frame_is_rejected() {
            let minter = sequential();
            let mut buf = BytesMut::new();
            MinterCodec::new().encode(&minter, &mut buf).unwrap();

            let mut small = MinterCodec::with_max_len(8);
            assert!(matches!(small.decode(&mut buf), Err(CodecError::Io(_))));
        }
    }
}
