/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Error types for the CobaltFIX engine.
//!
//! This module provides a unified error hierarchy using `thiserror`. The
//! session-level taxonomy in [`SessionError`] mirrors the FIX session reject
//! semantics: some kinds are recoverable in place, the rest either change the
//! session state or terminate the session.

use crate::types::SeqNum;
use thiserror::Error;

/// Result type alias using [`FixError`] as the error type.
pub type Result<T> = std::result::Result<T, FixError>;

/// Session reject reason code: required tag missing (tag 373 value 1).
pub const REJECT_REASON_REQUIRED_TAG_MISSING: u32 = 1;

/// Session reject reason code: value is incorrect (tag 373 value 5).
pub const REJECT_REASON_VALUE_IS_INCORRECT: u32 = 5;

/// Session reject reason code: CompID problem (tag 373 value 9).
pub const REJECT_REASON_COMP_ID_PROBLEM: u32 = 9;

/// Session reject reason code: SendingTime accuracy problem (tag 373 value 10).
pub const REJECT_REASON_SENDING_TIME_ACCURACY: u32 = 10;

/// Top-level error type for all CobaltFIX operations.
#[derive(Debug, Error)]
pub enum FixError {
    /// Error during message decoding.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error during message encoding.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Error in session layer operations.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Error in message store operations.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error from underlying transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur during FIX message decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Message buffer is incomplete, need more data.
    #[error("incomplete message, need more data")]
    Incomplete,

    /// Invalid BeginString field (tag 8).
    #[error("invalid begin string: expected 8=FIX.x.y")]
    InvalidBeginString,

    /// Missing BodyLength field (tag 9).
    #[error("missing body length field (tag 9)")]
    MissingBodyLength,

    /// Invalid BodyLength value.
    #[error("invalid body length value")]
    InvalidBodyLength,

    /// Missing MsgType field (tag 35).
    #[error("missing msg type field (tag 35)")]
    MissingMsgType,

    /// Checksum mismatch between calculated and declared values.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum value.
        calculated: u8,
        /// Declared checksum value in message.
        declared: u8,
    },

    /// Invalid tag format (not a valid integer).
    #[error("invalid tag format: {0}")]
    InvalidTag(String),

    /// Missing required field.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// Invalid field value for the expected type.
    #[error("invalid field value for tag {tag}: {reason}")]
    InvalidFieldValue {
        /// The tag number of the field.
        tag: u32,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// Invalid UTF-8 in string field.
    #[error("invalid utf-8 in field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Message exceeds maximum allowed size.
    #[error("message too large: {size} bytes exceeds maximum {max_size}")]
    MessageTooLarge {
        /// Actual message size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max_size: usize,
    },
}

/// Errors that occur during FIX message encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Missing required field during encoding.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// Invalid field value for encoding.
    #[error("invalid field value for tag {tag}: {reason}")]
    InvalidFieldValue {
        /// The tag number of the field.
        tag: u32,
        /// Description of why the value is invalid.
        reason: String,
    },
}

/// Session-level rejection and failure taxonomy.
///
/// The variants map one-to-one onto the session behaviors: `TargetTooHigh`
/// starts gap recovery, `TargetTooLow` without PossDup terminates the session,
/// the header problems terminate after a reject, and the remaining kinds are
/// answered with a session-level Reject while the session stays up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Inbound sequence number is higher than expected (gap detected).
    #[error("msg seq num too high, expecting {expected} but received {received}")]
    TargetTooHigh {
        /// Received sequence number.
        received: SeqNum,
        /// Expected sequence number.
        expected: SeqNum,
    },

    /// Inbound sequence number is lower than expected.
    #[error("msg seq num too low, expecting {expected} but received {received}")]
    TargetTooLow {
        /// Received sequence number.
        received: SeqNum,
        /// Expected sequence number.
        expected: SeqNum,
    },

    /// BeginString (tag 8) does not match the session.
    #[error("incorrect begin string: {received}")]
    IncorrectBeginString {
        /// The BeginString value received.
        received: String,
    },

    /// SenderCompID or TargetCompID does not match the session.
    #[error("comp id problem")]
    CompIdProblem,

    /// SendingTime (tag 52) outside the accuracy window, or earlier than
    /// OrigSendingTime on a possible duplicate.
    #[error("sending time accuracy problem")]
    SendingTimeAccuracyProblem,

    /// A mandatory tag is absent.
    #[error("required tag missing: {tag}")]
    RequiredTagMissing {
        /// The missing tag number.
        tag: u32,
    },

    /// A field value violates session semantics (e.g. NewSeqNo going
    /// backwards). `tag` is `None` when no tag should be referenced in the
    /// resulting Reject.
    #[error("value is incorrect (out of range) for this tag")]
    ValueIsIncorrect {
        /// The offending tag, if one should be reported.
        tag: Option<u32>,
    },

    /// Logon was rejected.
    #[error("logon rejected: {reason}")]
    LogonRejected {
        /// Reason for rejection.
        reason: String,
    },

    /// No session is registered under the given identity.
    #[error("unknown session: {session_id}")]
    UnknownSession {
        /// Display form of the session id.
        session_id: String,
    },

    /// The session event loop has terminated.
    #[error("session terminated")]
    Terminated,
}

impl SessionError {
    /// Returns the SessionRejectReason (tag 373) code for this error, if the
    /// error is answered with a session-level Reject.
    #[must_use]
    pub const fn reject_reason(&self) -> Option<u32> {
        match self {
            Self::RequiredTagMissing { .. } => Some(REJECT_REASON_REQUIRED_TAG_MISSING),
            Self::ValueIsIncorrect { .. } => Some(REJECT_REASON_VALUE_IS_INCORRECT),
            Self::CompIdProblem => Some(REJECT_REASON_COMP_ID_PROBLEM),
            Self::SendingTimeAccuracyProblem => Some(REJECT_REASON_SENDING_TIME_ACCURACY),
            _ => None,
        }
    }

    /// Returns the RefTagID (tag 371) to report in a Reject, if any.
    #[must_use]
    pub const fn ref_tag_id(&self) -> Option<u32> {
        match self {
            Self::RequiredTagMissing { tag } => Some(*tag),
            Self::ValueIsIncorrect { tag } => *tag,
            _ => None,
        }
    }
}

/// Errors in message store operations.
///
/// Any store failure is fatal to the owning session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A message was saved out of sequence.
    #[error("out of sequence save: expected seq {expected}, got {got}")]
    OutOfSequence {
        /// The sequence number the store expected next.
        expected: SeqNum,
        /// The sequence number offered.
        got: SeqNum,
    },

    /// Message not found in store.
    #[error("message not found: seq={seq_num}")]
    NotFound {
        /// Sequence number of the missing message.
        seq_num: SeqNum,
    },

    /// Store contents are inconsistent.
    #[error("store corrupted: {reason}")]
    Corrupted {
        /// Description of the corruption.
        reason: String,
    },

    /// I/O error in persistent store.
    #[error("store i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::ChecksumMismatch {
            calculated: 100,
            declared: 200,
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch: calculated 100, declared 200"
        );
    }

    #[test]
    fn test_fix_error_from_decode() {
        let fix_err: FixError = DecodeError::Incomplete.into();
        assert!(matches!(fix_err, FixError::Decode(DecodeError::Incomplete)));
    }

    #[test]
    fn test_session_error_reject_reason() {
        assert_eq!(
            SessionError::CompIdProblem.reject_reason(),
            Some(REJECT_REASON_COMP_ID_PROBLEM)
        );
        assert_eq!(
            SessionError::RequiredTagMissing { tag: 36 }.reject_reason(),
            Some(REJECT_REASON_REQUIRED_TAG_MISSING)
        );
        assert_eq!(
            SessionError::TargetTooHigh {
                received: SeqNum::new(10),
                expected: SeqNum::new(5)
            }
            .reject_reason(),
            None
        );
    }

    #[test]
    fn test_session_error_ref_tag() {
        assert_eq!(
            SessionError::RequiredTagMissing { tag: 36 }.ref_tag_id(),
            Some(36)
        );
        assert_eq!(
            SessionError::ValueIsIncorrect { tag: None }.ref_tag_id(),
            None
        );
        assert_eq!(
            SessionError::ValueIsIncorrect { tag: Some(36) }.ref_tag_id(),
            Some(36)
        );
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::OutOfSequence {
            expected: SeqNum::new(4),
            got: SeqNum::new(7),
        };
        assert_eq!(err.to_string(), "out of sequence save: expected seq 4, got 7");
    }
}
