/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Tokio codec for FIX message framing.
//!
//! A FIX frame is `8=<BeginString>|9=<BodyLength>|<body>|10=<CheckSum>|`
//! where BodyLength counts the bytes after tag 9's delimiter up to but not
//! including tag 10. The codec uses that count to find frame boundaries in a
//! byte stream, optionally validating the trailing checksum before handing
//! the frame on.

use bytes::{BufMut, BytesMut};
use cobaltfix_tagvalue::checksum::{calculate_checksum, parse_checksum};
use memchr::memchr;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// SOH delimiter.
const SOH: u8 = 0x01;

/// Byte length of the `10=XXX|` trailer.
const TRAILER_LEN: usize = 7;

/// Smallest frame worth inspecting.
const MIN_FRAME_LEN: usize = 20;

/// Errors that can occur while framing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Stream does not start with `8=`.
    #[error("invalid begin string: frame must start with 8=")]
    InvalidBeginString,

    /// BodyLength field (tag 9) is missing.
    #[error("missing body length field (tag 9)")]
    MissingBodyLength,

    /// BodyLength value is not a valid integer.
    #[error("invalid body length value")]
    InvalidBodyLength,

    /// Checksum trailer is malformed.
    #[error("invalid checksum trailer")]
    InvalidChecksum,

    /// Checksum mismatch.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum.
        calculated: u8,
        /// Declared checksum in the frame.
        declared: u8,
    },

    /// Frame exceeds the configured maximum size.
    #[error("message too large: {size} bytes exceeds maximum {max_size}")]
    MessageTooLarge {
        /// Frame size implied by BodyLength.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// I/O error from the underlying stream.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Tokio codec cutting FIX frames out of a byte stream.
#[derive(Debug, Clone)]
pub struct FixCodec {
    /// Maximum frame size in bytes.
    max_message_size: usize,
    /// Whether to validate the trailing checksum.
    validate_checksum: bool,
}

impl FixCodec {
    /// Creates a codec with a 1 MiB frame limit and checksum validation on.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_message_size: 1024 * 1024,
            validate_checksum: true,
        }
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets whether to validate checksums.
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }
}

impl Default for FixCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FixCodec {
    type Item = BytesMut;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < MIN_FRAME_LEN {
            return Ok(None);
        }

        if &src[0..2] != b"8=" {
            return Err(CodecError::InvalidBeginString);
        }

        let Some(first_soh) = memchr(SOH, src) else {
            return Ok(None);
        };

        // BodyLength must follow BeginString immediately.
        let body_len_start = first_soh + 1;
        if src.len() < body_len_start + 3 {
            return Ok(None);
        }
        if &src[body_len_start..body_len_start + 2] != b"9=" {
            return Err(CodecError::MissingBodyLength);
        }

        let Some(rel_soh) = memchr(SOH, &src[body_len_start..]) else {
            return Ok(None);
        };
        let body_len_soh = body_len_start + rel_soh;

        let body_length: usize = std::str::from_utf8(&src[body_len_start + 2..body_len_soh])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(CodecError::InvalidBodyLength)?;

        // header | body | 10=XXX|
        let total_length = body_len_soh + 1 + body_length + TRAILER_LEN;
        if total_length > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size: total_length,
                max_size: self.max_message_size,
            });
        }

        if src.len() < total_length {
            src.reserve(total_length - src.len());
            return Ok(None);
        }

        if self.validate_checksum {
            let trailer_start = total_length - TRAILER_LEN;
            if &src[trailer_start..trailer_start + 3] != b"10=" {
                return Err(CodecError::InvalidChecksum);
            }
            let declared = parse_checksum(&src[trailer_start + 3..trailer_start + 6])
                .ok_or(CodecError::InvalidChecksum)?;
            let calculated = calculate_checksum(&src[..trailer_start]);
            if calculated != declared {
                return Err(CodecError::ChecksumMismatch {
                    calculated,
                    declared,
                });
            }
        }

        Ok(Some(src.split_to(total_length)))
    }
}

impl Encoder<&[u8]> for FixCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(item);
        Ok(())
    }
}

impl Encoder<bytes::Bytes> for FixCodec {
    type Error = CodecError;

    fn encode(&mut self, item: bytes::Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(body: &str) -> Vec<u8> {
        let header = format!("8=FIX.4.4\x019={}\x01", body.len());
        let without_checksum = format!("{header}{body}");
        let checksum = calculate_checksum(without_checksum.as_bytes());
        format!("{without_checksum}10={checksum:03}\x01").into_bytes()
    }

    #[test]
    fn test_decode_complete_frame() {
        let mut codec = FixCodec::new();
        let msg = frame("35=0\x01");
        let mut buf = BytesMut::from(&msg[..]);

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(&result.unwrap()[..], &msg[..]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_frame_waits() {
        let mut codec = FixCodec::new();
        let msg = frame("35=0\x01");
        let mut buf = BytesMut::from(&msg[..msg.len() - 5]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_two_frames_back_to_back() {
        let mut codec = FixCodec::new();
        let first = frame("35=0\x01");
        let second = frame("35=1\x01112=X\x01");
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&first);
        buf.extend_from_slice(&second);

        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], &first[..]);
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], &second[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_rejects_bad_begin_string() {
        let mut codec = FixCodec::new();
        let mut buf = BytesMut::from(&b"9=FIX.4.4\x019=5\x0135=0\x0110=000\x01"[..]);

        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::InvalidBeginString)
        ));
    }

    #[test]
    fn test_decode_rejects_checksum_mismatch() {
        let mut codec = FixCodec::new();
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=5\x0135=0\x0110=000\x01"[..]);

        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_without_checksum_validation() {
        let mut codec = FixCodec::new().with_checksum_validation(false);
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=5\x0135=0\x0110=000\x01"[..]);

        assert!(codec.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn test_decode_enforces_max_size() {
        let mut codec = FixCodec::new().with_max_message_size(16);
        let msg = frame("35=0\x01");
        let mut buf = BytesMut::from(&msg[..]);

        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn test_encode_passthrough() {
        let mut codec = FixCodec::new();
        let msg = frame("35=0\x01");
        let mut dst = BytesMut::new();

        codec.encode(&msg[..], &mut dst).unwrap();
        assert_eq!(&dst[..], &msg[..]);
    }
}
