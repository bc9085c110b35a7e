/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX message encoder.
//!
//! The encoder accumulates the message body in tag=value form and, on
//! [`Encoder::finish`], wraps it with BeginString (tag 8), BodyLength (tag 9)
//! and CheckSum (tag 10). BodyLength counts the bytes between tag 9's
//! delimiter and the start of tag 10; CheckSum is the modulo-256 sum of every
//! preceding byte.

use crate::checksum::{calculate_checksum, format_checksum};
use bytes::{BufMut, BytesMut};
use cobaltfix_core::types::Timestamp;
use rust_decimal::Decimal;

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// FIX message encoder.
#[derive(Debug)]
pub struct Encoder {
    /// Buffer for the message body (between BodyLength and CheckSum).
    body: BytesMut,
    /// The BeginString value (e.g., "FIX.4.4").
    begin_string: &'static str,
}

impl Encoder {
    /// Creates a new encoder for the given BeginString.
    #[must_use]
    pub fn new(begin_string: &'static str) -> Self {
        Self {
            body: BytesMut::with_capacity(256),
            begin_string,
        }
    }

    /// Creates a new encoder with pre-allocated body capacity.
    #[must_use]
    pub fn with_capacity(begin_string: &'static str, capacity: usize) -> Self {
        Self {
            body: BytesMut::with_capacity(capacity),
            begin_string,
        }
    }

    /// Appends a field with a string value.
    #[inline]
    pub fn put_str(&mut self, tag: u32, value: &str) {
        self.put_raw(tag, value.as_bytes());
    }

    /// Appends a field with a signed integer value.
    #[inline]
    pub fn put_int(&mut self, tag: u32, value: i64) {
        let mut buf = itoa::Buffer::new();
        self.put_raw(tag, buf.format(value).as_bytes());
    }

    /// Appends a field with an unsigned integer value.
    #[inline]
    pub fn put_uint(&mut self, tag: u32, value: u64) {
        let mut buf = itoa::Buffer::new();
        self.put_raw(tag, buf.format(value).as_bytes());
    }

    /// Appends a field with a boolean value (Y/N).
    #[inline]
    pub fn put_bool(&mut self, tag: u32, value: bool) {
        self.put_raw(tag, if value { b"Y" } else { b"N" });
    }

    /// Appends a field with a single character value.
    #[inline]
    pub fn put_char(&mut self, tag: u32, value: char) {
        let mut buf = [0u8; 4];
        let s = value.encode_utf8(&mut buf);
        self.put_raw(tag, s.as_bytes());
    }

    /// Appends a field with a decimal value.
    #[inline]
    pub fn put_decimal(&mut self, tag: u32, value: Decimal) {
        self.put_str(tag, &value.to_string());
    }

    /// Appends a field with a FIX UTCTimestamp value (millisecond precision).
    #[inline]
    pub fn put_timestamp(&mut self, tag: u32, value: Timestamp) {
        self.put_raw(tag, value.format_millis().as_bytes());
    }

    /// Appends a field with raw value bytes.
    #[inline]
    pub fn put_raw(&mut self, tag: u32, value: &[u8]) {
        let mut tag_buf = itoa::Buffer::new();
        self.body.put_slice(tag_buf.format(tag).as_bytes());
        self.body.put_u8(b'=');
        self.body.put_slice(value);
        self.body.put_u8(SOH);
    }

    /// Finalizes the message: prepends BeginString and BodyLength, appends
    /// CheckSum, and returns the complete frame.
    #[must_use]
    pub fn finish(self) -> BytesMut {
        let body_len = self.body.len();

        let mut message = BytesMut::with_capacity(self.begin_string.len() + body_len + 32);
        message.put_slice(b"8=");
        message.put_slice(self.begin_string.as_bytes());
        message.put_u8(SOH);
        message.put_slice(b"9=");
        let mut len_buf = itoa::Buffer::new();
        message.put_slice(len_buf.format(body_len).as_bytes());
        message.put_u8(SOH);
        message.put_slice(&self.body);

        let checksum = calculate_checksum(&message);
        message.put_slice(b"10=");
        message.put_slice(&format_checksum(checksum));
        message.put_u8(SOH);

        message
    }

    /// Returns the current body length in bytes.
    #[inline]
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Clears the body so the encoder can be reused.
    #[inline]
    pub fn clear(&mut self) {
        self.body.clear();
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new("FIX.4.4")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::parse_checksum;

    #[test]
    fn test_encoder_basic() {
        let mut encoder = Encoder::new("FIX.4.4");
        encoder.put_str(35, "0");

        let message = encoder.finish();
        let msg_str = String::from_utf8_lossy(&message);

        assert!(msg_str.starts_with("8=FIX.4.4\x019="));
        assert!(msg_str.contains("35=0\x01"));
        assert!(msg_str.contains("10="));
    }

    #[test]
    fn test_encoder_body_length_is_exact() {
        let mut encoder = Encoder::new("FIX.4.2");
        encoder.put_str(35, "0");
        encoder.put_str(49, "A");
        let message = encoder.finish();

        // 35=0|49=A| is 10 bytes.
        let msg_str = String::from_utf8_lossy(&message);
        assert!(msg_str.contains("9=10\x01"));
    }

    #[test]
    fn test_encoder_checksum_matches() {
        let mut encoder = Encoder::new("FIX.4.4");
        encoder.put_str(35, "D");
        encoder.put_str(49, "SENDER");
        encoder.put_uint(34, 42);
        let message = encoder.finish();

        // Last 7 bytes are 10=XXX|.
        let trailer = &message[message.len() - 7..];
        assert_eq!(&trailer[..3], b"10=");
        let declared = parse_checksum(&trailer[3..6]).unwrap();
        let calculated = calculate_checksum(&message[..message.len() - 7]);
        assert_eq!(declared, calculated);
    }

    #[test]
    fn test_encoder_value_types() {
        let mut encoder = Encoder::new("FIX.4.4");
        encoder.put_bool(43, true);
        encoder.put_bool(123, false);
        encoder.put_char(54, '1');
        encoder.put_int(9999, -5);
        encoder.put_decimal(44, "101.25".parse().unwrap());

        let message = encoder.finish();
        let msg_str = String::from_utf8_lossy(&message);

        assert!(msg_str.contains("43=Y\x01"));
        assert!(msg_str.contains("123=N\x01"));
        assert!(msg_str.contains("54=1\x01"));
        assert!(msg_str.contains("9999=-5\x01"));
        assert!(msg_str.contains("44=101.25\x01"));
    }

    #[test]
    fn test_encoder_clear() {
        let mut encoder = Encoder::new("FIX.4.4");
        encoder.put_str(35, "0");
        assert!(encoder.body_len() > 0);

        encoder.clear();
        assert_eq!(encoder.body_len(), 0);
    }
}
