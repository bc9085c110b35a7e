/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Zero-copy FIX message decoder.
//!
//! The decoder walks a byte buffer field by field, returning value slices
//! that reference the original input. A full [`Decoder::decode`] pass
//! validates the framing invariants (leading BeginString and BodyLength,
//! trailing CheckSum) and produces a [`RawMessage`].

use crate::checksum::{calculate_checksum, parse_checksum};
use cobaltfix_core::error::DecodeError;
use cobaltfix_core::field::FieldRef;
use cobaltfix_core::message::{MsgType, RawMessage};
use cobaltfix_core::tags;
use memchr::memchr;
use smallvec::SmallVec;

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// Equals sign delimiter between tag and value.
pub const EQUALS: u8 = b'=';

/// Zero-copy FIX message decoder.
#[derive(Debug)]
pub struct Decoder<'a> {
    /// Input buffer.
    input: &'a [u8],
    /// Current position in the buffer.
    offset: usize,
    /// Whether to validate the trailing checksum.
    validate_checksum: bool,
}

impl<'a> Decoder<'a> {
    /// Creates a new decoder over the given input buffer.
    #[inline]
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            validate_checksum: true,
        }
    }

    /// Sets whether the trailing checksum is validated during decoding.
    #[inline]
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    /// Decodes one complete FIX message from the buffer.
    ///
    /// # Errors
    /// Returns `DecodeError` if the message is malformed or incomplete.
    pub fn decode(&mut self) -> Result<RawMessage<'a>, DecodeError> {
        let start_offset = self.offset;

        // BeginString (tag 8) must lead.
        let begin_string_field = self.next_field().ok_or(DecodeError::Incomplete)?;
        if begin_string_field.tag != tags::BEGIN_STRING {
            return Err(DecodeError::InvalidBeginString);
        }
        let begin_string_start =
            begin_string_field.value.as_ptr() as usize - self.input.as_ptr() as usize;
        let begin_string = begin_string_start..begin_string_start + begin_string_field.value.len();

        // BodyLength (tag 9) must follow immediately.
        let body_length_field = self.next_field().ok_or(DecodeError::MissingBodyLength)?;
        if body_length_field.tag != tags::BODY_LENGTH {
            return Err(DecodeError::MissingBodyLength);
        }
        let body_length: usize = body_length_field
            .as_str()?
            .parse()
            .map_err(|_| DecodeError::InvalidBodyLength)?;

        let body_start = self.offset;

        // MsgType (tag 35) opens the body.
        let msg_type_field = self.next_field().ok_or(DecodeError::MissingMsgType)?;
        if msg_type_field.tag != tags::MSG_TYPE {
            return Err(DecodeError::MissingMsgType);
        }
        let msg_type: MsgType = msg_type_field
            .as_str()?
            .parse()
            .unwrap_or(MsgType::Heartbeat);

        let mut fields: SmallVec<[FieldRef<'a>; 32]> = SmallVec::new();
        fields.push(begin_string_field);
        fields.push(body_length_field);
        fields.push(msg_type_field);

        // Remaining fields up to the checksum trailer.
        let mut checksum_field: Option<FieldRef<'a>> = None;
        while let Some(field) = self.next_field() {
            if field.tag == tags::CHECK_SUM {
                checksum_field = Some(field);
                break;
            }
            fields.push(field);
        }

        if self.validate_checksum {
            let checksum_ref = checksum_field.ok_or(DecodeError::Incomplete)?;
            let declared =
                parse_checksum(checksum_ref.value).ok_or_else(|| DecodeError::InvalidFieldValue {
                    tag: tags::CHECK_SUM,
                    reason: "invalid checksum format".to_string(),
                })?;

            // Everything before the "10=" prefix participates in the sum.
            let checksum_start =
                checksum_ref.value.as_ptr() as usize - self.input.as_ptr() as usize - 3;
            let calculated = calculate_checksum(&self.input[start_offset..checksum_start]);

            if calculated != declared {
                return Err(DecodeError::ChecksumMismatch {
                    calculated,
                    declared,
                });
            }
        }

        let body = body_start..body_start + body_length;

        Ok(RawMessage::new(
            &self.input[start_offset..self.offset],
            begin_string,
            body,
            msg_type,
            fields,
        ))
    }

    /// Parses the next `tag=value` field, or `None` at end of input.
    #[inline]
    pub fn next_field(&mut self) -> Option<FieldRef<'a>> {
        if self.offset >= self.input.len() {
            return None;
        }

        let remaining = &self.input[self.offset..];

        let eq_pos = memchr(EQUALS, remaining)?;
        let tag = parse_tag(&remaining[..eq_pos])?;

        let value_start = eq_pos + 1;
        let soh_pos = memchr(SOH, &remaining[value_start..])?;
        let value = &remaining[value_start..value_start + soh_pos];

        self.offset += value_start + soh_pos + 1;

        Some(FieldRef::new(tag, value))
    }

    /// Returns the current offset in the buffer.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the remaining bytes in the buffer.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.offset..]
    }

    /// Returns true if the buffer has been fully consumed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offset >= self.input.len()
    }

    /// Resets the decoder to the beginning of the buffer.
    #[inline]
    pub fn reset(&mut self) {
        self.offset = 0;
    }
}

/// Parses an ASCII tag number. Tags are at most 10 digits.
#[inline]
fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }

    let mut result: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        result = result.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag(b"8"), Some(8));
        assert_eq!(parse_tag(b"35"), Some(35));
        assert_eq!(parse_tag(b"12345"), Some(12345));
        assert_eq!(parse_tag(b""), None);
        assert_eq!(parse_tag(b"abc"), None);
        assert_eq!(parse_tag(b"12a"), None);
    }

    #[test]
    fn test_next_field() {
        let input = b"8=FIX.4.4\x019=5\x0135=0\x01";
        let mut decoder = Decoder::new(input);

        let field1 = decoder.next_field().unwrap();
        assert_eq!(field1.tag, 8);
        assert_eq!(field1.as_str().unwrap(), "FIX.4.4");

        let field2 = decoder.next_field().unwrap();
        assert_eq!(field2.tag, 9);
        assert_eq!(field2.as_str().unwrap(), "5");

        let field3 = decoder.next_field().unwrap();
        assert_eq!(field3.tag, 35);
        assert_eq!(field3.as_str().unwrap(), "0");

        assert!(decoder.next_field().is_none());
    }

    #[test]
    fn test_decoder_empty() {
        let mut decoder = Decoder::new(b"");
        assert!(decoder.next_field().is_none());
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_decoder_incomplete_field() {
        let mut decoder = Decoder::new(b"8=FIX.4.4");
        assert!(decoder.next_field().is_none());
    }

    #[test]
    fn test_decode_round_trip() {
        let mut enc = Encoder::new("FIX.4.4");
        enc.put_str(35, "1");
        enc.put_str(49, "SENDER");
        enc.put_str(56, "TARGET");
        enc.put_uint(34, 7);
        enc.put_str(112, "PING");
        let bytes = enc.finish();

        let raw = Decoder::new(&bytes).decode().unwrap();
        assert_eq!(raw.begin_string(), "FIX.4.4");
        assert_eq!(*raw.msg_type(), MsgType::TestRequest);
        assert_eq!(raw.get_field_str(49), Some("SENDER"));
        assert_eq!(raw.get_field_str(56), Some("TARGET"));
        assert_eq!(raw.get_field_str(34), Some("7"));
        assert_eq!(raw.get_field_str(112), Some("PING"));
        // Field order survives the round trip.
        let tags_in_order: Vec<u32> = raw.fields().map(|f| f.tag).collect();
        assert_eq!(tags_in_order, vec![8, 9, 35, 49, 56, 34, 112]);
    }

    #[test]
    fn test_decode_rejects_bad_checksum() {
        let input = b"8=FIX.4.4\x019=5\x0135=0\x0110=999\x01";
        let err = Decoder::new(input).decode().unwrap_err();
        assert!(matches!(err, DecodeError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_decode_without_checksum_validation() {
        let input = b"8=FIX.4.4\x019=5\x0135=0\x0110=999\x01";
        let raw = Decoder::new(input)
            .with_checksum_validation(false)
            .decode()
            .unwrap();
        assert_eq!(*raw.msg_type(), MsgType::Heartbeat);
    }

    #[test]
    fn test_decode_rejects_missing_begin_string() {
        let input = b"9=5\x0135=0\x0110=000\x01";
        let err = Decoder::new(input).decode().unwrap_err();
        assert!(matches!(err, DecodeError::InvalidBeginString));
    }
}
