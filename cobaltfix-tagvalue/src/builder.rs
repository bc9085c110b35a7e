/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Outbound message builder.
//!
//! Outbound messages are assembled through a [`MessageBuilder`] and frozen
//! into canonical bytes by [`MessageBuilder::encode`]. The builder keeps
//! header and body fields in separate ordered lists so the session layer can
//! stamp the default header (CompIDs, MsgSeqNum, SendingTime, PossDupFlag)
//! after the application has populated the body. `set_*` replaces an existing
//! field in place, which makes stamping idempotent; `push_body` appends
//! unconditionally and is used when replaying stored messages whose bodies
//! may legitimately repeat tags.

use crate::encoder::Encoder;
use bytes::Bytes;
use cobaltfix_core::error::EncodeError;
use cobaltfix_core::message::MsgType;
use cobaltfix_core::tags;
use cobaltfix_core::types::Timestamp;
use rust_decimal::Decimal;

/// Header fields every encoded message must carry besides the framing tags.
const REQUIRED_HEADER: [u32; 4] = [
    tags::SENDER_COMP_ID,
    tags::TARGET_COMP_ID,
    tags::MSG_SEQ_NUM,
    tags::SENDING_TIME,
];

/// Builder for outbound FIX messages.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    /// The message type (tag 35).
    msg_type: MsgType,
    /// Header fields after tag 35, in insertion order.
    header: Vec<(u32, String)>,
    /// Body fields, in insertion order.
    body: Vec<(u32, String)>,
}

impl MessageBuilder {
    /// Creates a builder for the given message type.
    #[must_use]
    pub fn new(msg_type: MsgType) -> Self {
        Self {
            msg_type,
            header: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Returns the message type.
    #[inline]
    #[must_use]
    pub fn msg_type(&self) -> &MsgType {
        &self.msg_type
    }

    /// Sets a header field, replacing any existing value for the tag.
    pub fn set_header(&mut self, tag: u32, value: impl Into<String>) -> &mut Self {
        set_field(&mut self.header, tag, value.into());
        self
    }

    /// Sets a header field to an unsigned integer value.
    pub fn set_header_uint(&mut self, tag: u32, value: u64) -> &mut Self {
        self.set_header(tag, value.to_string())
    }

    /// Sets a header field to a boolean value (Y/N).
    pub fn set_header_bool(&mut self, tag: u32, value: bool) -> &mut Self {
        self.set_header(tag, if value { "Y" } else { "N" })
    }

    /// Sets a header field to a FIX UTCTimestamp value.
    pub fn set_header_timestamp(&mut self, tag: u32, value: Timestamp) -> &mut Self {
        self.set_header(tag, value.format_millis().as_str())
    }

    /// Sets a body field, replacing any existing value for the tag.
    pub fn set_body(&mut self, tag: u32, value: impl Into<String>) -> &mut Self {
        set_field(&mut self.body, tag, value.into());
        self
    }

    /// Sets a body field to an unsigned integer value.
    pub fn set_body_uint(&mut self, tag: u32, value: u64) -> &mut Self {
        self.set_body(tag, value.to_string())
    }

    /// Sets a body field to a boolean value (Y/N).
    pub fn set_body_bool(&mut self, tag: u32, value: bool) -> &mut Self {
        self.set_body(tag, if value { "Y" } else { "N" })
    }

    /// Sets a body field to a decimal value.
    pub fn set_body_decimal(&mut self, tag: u32, value: Decimal) -> &mut Self {
        self.set_body(tag, value.to_string())
    }

    /// Appends a body field without replacing earlier occurrences of the tag.
    ///
    /// Repeating-group entries depend on duplicate tags in declared order, so
    /// replayed messages are rebuilt through this method.
    pub fn push_body(&mut self, tag: u32, value: impl Into<String>) -> &mut Self {
        self.body.push((tag, value.into()));
        self
    }

    /// Returns the current value of a header field.
    #[must_use]
    pub fn header_field(&self, tag: u32) -> Option<&str> {
        get_field(&self.header, tag)
    }

    /// Returns the current value of a body field.
    #[must_use]
    pub fn body_field(&self, tag: u32) -> Option<&str> {
        get_field(&self.body, tag)
    }

    /// Freezes the builder into a canonical wire frame.
    ///
    /// # Errors
    /// Returns `EncodeError::MissingRequiredField` if the default header has
    /// not been stamped (CompIDs, MsgSeqNum, SendingTime).
    pub fn encode(&self, begin_string: &'static str) -> Result<Bytes, EncodeError> {
        for tag in REQUIRED_HEADER {
            if self.header_field(tag).is_none() {
                return Err(EncodeError::MissingRequiredField { tag });
            }
        }

        let mut encoder = Encoder::with_capacity(begin_string, 64 + self.approximate_len());
        encoder.put_str(tags::MSG_TYPE, self.msg_type.as_str());
        for (tag, value) in &self.header {
            encoder.put_str(*tag, value);
        }
        for (tag, value) in &self.body {
            encoder.put_str(*tag, value);
        }
        Ok(encoder.finish().freeze())
    }

    fn approximate_len(&self) -> usize {
        self.header
            .iter()
            .chain(self.body.iter())
            .map(|(_, v)| v.len() + 8)
            .sum()
    }
}

fn set_field(fields: &mut Vec<(u32, String)>, tag: u32, value: String) {
    match fields.iter_mut().find(|(t, _)| *t == tag) {
        Some((_, existing)) => *existing = value,
        None => fields.push((tag, value)),
    }
}

fn get_field(fields: &[(u32, String)], tag: u32) -> Option<&str> {
    fields
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Decoder;

    fn stamp(builder: &mut MessageBuilder, seq: u64) {
        builder.set_header(tags::SENDER_COMP_ID, "SENDER");
        builder.set_header(tags::TARGET_COMP_ID, "TARGET");
        builder.set_header_uint(tags::MSG_SEQ_NUM, seq);
        builder.set_header_timestamp(tags::SENDING_TIME, Timestamp::from_millis(0));
    }

    #[test]
    fn test_builder_encode() {
        let mut b = MessageBuilder::new(MsgType::TestRequest);
        b.set_body(tags::TEST_REQ_ID, "PING");
        stamp(&mut b, 3);

        let bytes = b.encode("FIX.4.4").unwrap();
        let raw = Decoder::new(&bytes).decode().unwrap();

        assert_eq!(*raw.msg_type(), MsgType::TestRequest);
        assert_eq!(raw.get_field_str(tags::MSG_SEQ_NUM), Some("3"));
        assert_eq!(raw.get_field_str(tags::TEST_REQ_ID), Some("PING"));
        // Header fields precede the body on the wire.
        let order: Vec<u32> = raw.fields().map(|f| f.tag).collect();
        assert_eq!(order, vec![8, 9, 35, 49, 56, 34, 52, 112]);
    }

    #[test]
    fn test_builder_requires_stamped_header() {
        let b = MessageBuilder::new(MsgType::Heartbeat);
        let err = b.encode("FIX.4.4").unwrap_err();
        assert!(matches!(
            err,
            EncodeError::MissingRequiredField {
                tag: tags::SENDER_COMP_ID
            }
        ));
    }

    #[test]
    fn test_builder_set_replaces_in_place() {
        let mut b = MessageBuilder::new(MsgType::Heartbeat);
        stamp(&mut b, 1);
        stamp(&mut b, 2);

        assert_eq!(b.header_field(tags::MSG_SEQ_NUM), Some("2"));
        let bytes = b.encode("FIX.4.4").unwrap();
        let raw = Decoder::new(&bytes).decode().unwrap();
        assert_eq!(
            raw.fields().filter(|f| f.tag == tags::MSG_SEQ_NUM).count(),
            1
        );
    }

    #[test]
    fn test_builder_push_body_preserves_duplicates() {
        let mut b = MessageBuilder::new(MsgType::App("D".to_string()));
        stamp(&mut b, 1);
        b.push_body(448, "PARTY1");
        b.push_body(448, "PARTY2");

        let bytes = b.encode("FIX.4.4").unwrap();
        let raw = Decoder::new(&bytes).decode().unwrap();
        let values: Vec<&str> = raw
            .fields()
            .filter(|f| f.tag == 448)
            .map(|f| f.as_str().unwrap())
            .collect();
        assert_eq!(values, vec!["PARTY1", "PARTY2"]);
    }

    #[test]
    fn test_builder_bool_and_decimal() {
        let mut b = MessageBuilder::new(MsgType::SequenceReset);
        stamp(&mut b, 5);
        b.set_header_bool(tags::POSS_DUP_FLAG, true);
        b.set_body_bool(tags::GAP_FILL_FLAG, true);
        b.set_body_decimal(tags::PRICE, "99.5".parse().unwrap());

        let bytes = b.encode("FIX.4.4").unwrap();
        let raw = Decoder::new(&bytes).decode().unwrap();
        assert_eq!(raw.get_field_str(tags::POSS_DUP_FLAG), Some("Y"));
        assert_eq!(raw.get_field_str(tags::GAP_FILL_FLAG), Some("Y"));
        assert_eq!(raw.get_field_str(tags::PRICE), Some("99.5"));
    }
}
