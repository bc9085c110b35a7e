/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message model for the session layer.
//!
//! This module provides:
//! - [`MsgType`]: the administrative message types plus an application escape
//! - [`RawMessage`]: zero-copy view into a FIX message buffer
//! - [`OwnedMessage`]: owned message for storage, stashing, and cross-task
//!   transfer, with typed accessors for the standard header fields
//!
//! Application payloads are deliberately untyped here: the engine dispatches
//! on the MsgType value and hands application messages to the registered
//! callbacks without interpreting their bodies.

use crate::error::DecodeError;
use crate::field::FieldRef;
use crate::tags;
use crate::types::{SeqNum, Timestamp};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::ops::Range;

/// FIX message type (tag 35).
///
/// The administrative types the session layer acts on are first-class
/// variants; every other MsgType value is carried verbatim in [`MsgType::App`]
/// and routed to the application callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MsgType {
    /// Heartbeat (0).
    #[default]
    Heartbeat,
    /// Test Request (1).
    TestRequest,
    /// Resend Request (2).
    ResendRequest,
    /// Reject (3).
    Reject,
    /// Sequence Reset (4).
    SequenceReset,
    /// Logout (5).
    Logout,
    /// Logon (A).
    Logon,
    /// Any application-level message type (e.g. "D", "8", "AE").
    App(String),
}

impl std::str::FromStr for MsgType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "0" => Self::Heartbeat,
            "1" => Self::TestRequest,
            "2" => Self::ResendRequest,
            "3" => Self::Reject,
            "4" => Self::SequenceReset,
            "5" => Self::Logout,
            "A" => Self::Logon,
            other => Self::App(other.to_string()),
        })
    }
}

impl MsgType {
    /// Returns the wire representation of this message type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Heartbeat => "0",
            Self::TestRequest => "1",
            Self::ResendRequest => "2",
            Self::Reject => "3",
            Self::SequenceReset => "4",
            Self::Logout => "5",
            Self::Logon => "A",
            Self::App(s) => s.as_str(),
        }
    }

    /// Returns true if this is an administrative message type.
    ///
    /// Administrative messages belong to the session layer and are never
    /// retransmitted during a resend; their slots are gap-filled instead.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        !matches!(self, Self::App(_))
    }

    /// Returns true if this is an application message type.
    #[must_use]
    pub fn is_app(&self) -> bool {
        matches!(self, Self::App(_))
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Zero-copy view into a FIX message buffer.
///
/// Holds references into the original buffer; fields are stored as slices so
/// parsing does not allocate. Field order is preserved exactly as received.
#[derive(Debug, Clone)]
pub struct RawMessage<'a> {
    /// The complete message buffer.
    buffer: &'a [u8],
    /// Range of the BeginString field value.
    begin_string: Range<usize>,
    /// Range of the message body (after BodyLength, before checksum).
    body: Range<usize>,
    /// The parsed message type.
    msg_type: MsgType,
    /// Parsed field references in wire order.
    fields: SmallVec<[FieldRef<'a>; 32]>,
}

impl<'a> RawMessage<'a> {
    /// Creates a new RawMessage from parsed components.
    #[must_use]
    pub fn new(
        buffer: &'a [u8],
        begin_string: Range<usize>,
        body: Range<usize>,
        msg_type: MsgType,
        fields: SmallVec<[FieldRef<'a>; 32]>,
    ) -> Self {
        Self {
            buffer,
            begin_string,
            body,
            msg_type,
            fields,
        }
    }

    /// Returns the complete message buffer.
    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Returns the BeginString value (e.g., "FIX.4.4").
    #[must_use]
    pub fn begin_string(&self) -> &'a str {
        std::str::from_utf8(&self.buffer[self.begin_string.clone()]).unwrap_or("")
    }

    /// Returns the message type.
    #[inline]
    #[must_use]
    pub fn msg_type(&self) -> &MsgType {
        &self.msg_type
    }

    /// Returns an iterator over all fields in wire order.
    #[inline]
    pub fn fields(&self) -> impl Iterator<Item = &FieldRef<'a>> {
        self.fields.iter()
    }

    /// Returns the number of fields in the message.
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Gets the first field with the given tag.
    #[must_use]
    pub fn get_field(&self, tag: u32) -> Option<&FieldRef<'a>> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    /// Gets a field value as a string.
    #[must_use]
    pub fn get_field_str(&self, tag: u32) -> Option<&'a str> {
        self.get_field(tag).and_then(|f| f.as_str().ok())
    }

    /// Gets a field value parsed as the specified type.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is not found or cannot be parsed.
    pub fn get_field_as<T: std::str::FromStr>(&self, tag: u32) -> Result<T, DecodeError> {
        self.get_field(tag)
            .ok_or(DecodeError::MissingRequiredField { tag })?
            .parse()
    }

    /// Returns the message body range.
    #[inline]
    #[must_use]
    pub fn body_range(&self) -> &Range<usize> {
        &self.body
    }

    /// Returns the message length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the message is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Converts this borrowed message to an owned message.
    #[must_use]
    pub fn to_owned(&self) -> OwnedMessage {
        OwnedMessage::from_raw(self)
    }
}

/// Owned FIX message for storage and cross-task transfer.
///
/// Unlike [`RawMessage`], this struct owns its buffer and can be stashed in a
/// gap-recovery buffer or moved into another task.
#[derive(Debug, Clone)]
pub struct OwnedMessage {
    /// The complete message buffer.
    buffer: Bytes,
    /// The parsed message type.
    msg_type: MsgType,
    /// Field offsets in wire order: (tag, value range).
    field_offsets: Vec<(u32, Range<usize>)>,
}

impl OwnedMessage {
    /// Creates an OwnedMessage from a RawMessage, copying the buffer.
    #[must_use]
    pub fn from_raw(raw: &RawMessage<'_>) -> Self {
        let buffer = Bytes::copy_from_slice(raw.buffer);
        let field_offsets = raw
            .fields
            .iter()
            .map(|f| {
                let start = f.value.as_ptr() as usize - raw.buffer.as_ptr() as usize;
                let end = start + f.value.len();
                (f.tag, start..end)
            })
            .collect();

        Self {
            buffer,
            msg_type: raw.msg_type.clone(),
            field_offsets,
        }
    }

    /// Creates an OwnedMessage from pre-parsed components.
    #[must_use]
    pub fn new(buffer: Bytes, msg_type: MsgType, field_offsets: Vec<(u32, Range<usize>)>) -> Self {
        Self {
            buffer,
            msg_type,
            field_offsets,
        }
    }

    /// Returns the message type.
    #[inline]
    #[must_use]
    pub fn msg_type(&self) -> &MsgType {
        &self.msg_type
    }

    /// Returns the message bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns the message length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the message is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Gets the first value for a tag as raw bytes.
    #[must_use]
    pub fn get_field(&self, tag: u32) -> Option<&[u8]> {
        self.field_offsets
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, range)| &self.buffer[range.clone()])
    }

    /// Gets a field value as a string.
    #[must_use]
    pub fn get_field_str(&self, tag: u32) -> Option<&str> {
        self.get_field(tag)
            .and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Gets a field value parsed as a u64.
    #[must_use]
    pub fn get_field_u64(&self, tag: u32) -> Option<u64> {
        self.get_field_str(tag).and_then(|s| s.parse().ok())
    }

    /// Gets a boolean field ('Y'/'N').
    #[must_use]
    pub fn get_field_bool(&self, tag: u32) -> Option<bool> {
        match self.get_field(tag) {
            Some(b"Y") => Some(true),
            Some(b"N") => Some(false),
            _ => None,
        }
    }

    /// Returns the BeginString value (tag 8).
    #[must_use]
    pub fn begin_string(&self) -> Option<&str> {
        self.get_field_str(tags::BEGIN_STRING)
    }

    /// Returns the SenderCompID value (tag 49).
    #[must_use]
    pub fn sender_comp_id(&self) -> Option<&str> {
        self.get_field_str(tags::SENDER_COMP_ID)
    }

    /// Returns the TargetCompID value (tag 56).
    #[must_use]
    pub fn target_comp_id(&self) -> Option<&str> {
        self.get_field_str(tags::TARGET_COMP_ID)
    }

    /// Returns the MsgSeqNum value (tag 34).
    #[must_use]
    pub fn msg_seq_num(&self) -> Option<SeqNum> {
        self.get_field_u64(tags::MSG_SEQ_NUM).map(SeqNum::new)
    }

    /// Returns the SendingTime value (tag 52).
    #[must_use]
    pub fn sending_time(&self) -> Option<Timestamp> {
        self.get_field_str(tags::SENDING_TIME)
            .and_then(Timestamp::parse_fix)
    }

    /// Returns the OrigSendingTime value (tag 122).
    #[must_use]
    pub fn orig_sending_time(&self) -> Option<Timestamp> {
        self.get_field_str(tags::ORIG_SENDING_TIME)
            .and_then(Timestamp::parse_fix)
    }

    /// Returns true if PossDupFlag (tag 43) is set to Y.
    #[must_use]
    pub fn poss_dup_flag(&self) -> bool {
        self.get_field_bool(tags::POSS_DUP_FLAG).unwrap_or(false)
    }

    /// Returns the number of fields.
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.field_offsets.len()
    }

    /// Consumes the message and returns the underlying buffer.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_type_from_str() {
        assert_eq!("0".parse::<MsgType>().unwrap(), MsgType::Heartbeat);
        assert_eq!("4".parse::<MsgType>().unwrap(), MsgType::SequenceReset);
        assert_eq!("A".parse::<MsgType>().unwrap(), MsgType::Logon);
        assert_eq!(
            "D".parse::<MsgType>().unwrap(),
            MsgType::App("D".to_string())
        );
    }

    #[test]
    fn test_msg_type_as_str() {
        assert_eq!(MsgType::Heartbeat.as_str(), "0");
        assert_eq!(MsgType::Logon.as_str(), "A");
        assert_eq!(MsgType::App("AE".to_string()).as_str(), "AE");
    }

    #[test]
    fn test_msg_type_is_admin() {
        assert!(MsgType::Heartbeat.is_admin());
        assert!(MsgType::TestRequest.is_admin());
        assert!(MsgType::ResendRequest.is_admin());
        assert!(MsgType::Reject.is_admin());
        assert!(MsgType::SequenceReset.is_admin());
        assert!(MsgType::Logout.is_admin());
        assert!(MsgType::Logon.is_admin());
        assert!(!MsgType::App("D".to_string()).is_admin());
        assert!(MsgType::App("8".to_string()).is_app());
    }

    #[test]
    fn test_owned_message_field_access() {
        // Buffer: "8=FIX.4.4|35=D|49=SENDER|" with value offsets computed by hand.
        let buffer = Bytes::from_static(b"8=FIX.4.4\x0135=D\x0149=SENDER\x01");
        let field_offsets = vec![(8, 2..9), (35, 13..14), (49, 18..24)];
        let msg = OwnedMessage::new(buffer, MsgType::App("D".to_string()), field_offsets);

        assert_eq!(msg.get_field_str(8), Some("FIX.4.4"));
        assert_eq!(msg.begin_string(), Some("FIX.4.4"));
        assert_eq!(msg.sender_comp_id(), Some("SENDER"));
        assert_eq!(msg.get_field_str(999), None);
        assert!(!msg.poss_dup_flag());
    }

    #[test]
    fn test_owned_message_header_accessors() {
        let buffer = Bytes::from_static(b"34=17\x0143=Y\x0152=20240102-03:04:05.678\x01");
        let field_offsets = vec![(34, 3..5), (43, 9..10), (52, 14..35)];
        let msg = OwnedMessage::new(buffer, MsgType::Heartbeat, field_offsets);

        assert_eq!(msg.msg_seq_num(), Some(SeqNum::new(17)));
        assert!(msg.poss_dup_flag());
        let ts = msg.sending_time().unwrap();
        assert!(ts.format_millis().starts_with("20240102-03:04:05.678"));
    }
}
