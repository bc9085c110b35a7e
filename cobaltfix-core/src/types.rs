/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Core types for FIX session operations.
//!
//! This module provides the fundamental value types used throughout the engine:
//! - [`SeqNum`]: message sequence number
//! - [`Timestamp`]: FIX-formatted UTC timestamp
//! - [`CompId`]: component identifier (SenderCompID, TargetCompID)
//! - [`BeginString`]: protocol version token (tag 8)

use arrayvec::ArrayString;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Maximum length for CompID strings in bytes.
pub const COMP_ID_MAX_LEN: usize = 32;

/// FIX message sequence number.
///
/// Sequence numbers start at 1 and increment by one per message in each
/// direction of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SeqNum(u64);

impl SeqNum {
    /// Creates a new sequence number.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence number value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Checks if this sequence number is valid (>= 1).
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 1
    }
}

impl Default for SeqNum {
    fn default() -> Self {
        Self(1)
    }
}

impl From<u64> for SeqNum {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<SeqNum> for u64 {
    fn from(seq: SeqNum) -> Self {
        seq.0
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// FIX protocol UTC timestamp with nanosecond precision.
///
/// The wire format is `YYYYMMDD-HH:MM:SS.sss` (tag 52, tag 122), with optional
/// microsecond or second-only precision accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Nanoseconds since Unix epoch (1970-01-01 00:00:00 UTC).
    nanos_since_epoch: u64,
}

impl Timestamp {
    /// Creates a timestamp from nanoseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self {
            nanos_since_epoch: nanos,
        }
    }

    /// Creates a timestamp from milliseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            nanos_since_epoch: millis * 1_000_000,
        }
    }

    /// Returns the current UTC timestamp.
    #[inline]
    #[must_use]
    pub fn now() -> Self {
        let dt = Utc::now();
        Self {
            nanos_since_epoch: dt.timestamp_nanos_opt().unwrap_or(0) as u64,
        }
    }

    /// Returns nanoseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.nanos_since_epoch
    }

    /// Returns milliseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.nanos_since_epoch / 1_000_000
    }

    /// Returns the absolute difference between two timestamps.
    #[must_use]
    pub const fn abs_delta(self, other: Self) -> Duration {
        Duration::from_nanos(self.nanos_since_epoch.abs_diff(other.nanos_since_epoch))
    }

    /// Converts to a chrono `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.nanos_since_epoch as i64)
    }

    /// Parses a FIX UTCTimestamp value.
    ///
    /// Accepts `YYYYMMDD-HH:MM:SS` with an optional fractional-second suffix
    /// of up to nanosecond precision.
    #[must_use]
    pub fn parse_fix(s: &str) -> Option<Self> {
        let dt = NaiveDateTime::parse_from_str(s, "%Y%m%d-%H:%M:%S%.f").ok()?;
        let nanos = dt.and_utc().timestamp_nanos_opt()?;
        if nanos < 0 {
            return None;
        }
        Some(Self {
            nanos_since_epoch: nanos as u64,
        })
    }

    /// Formats the timestamp in FIX format with millisecond precision.
    ///
    /// Format: `YYYYMMDD-HH:MM:SS.sss`
    #[must_use]
    pub fn format_millis(self) -> ArrayString<21> {
        let dt = self.to_datetime();
        let mut buf = ArrayString::new();
        let _ = std::fmt::write(
            &mut buf,
            format_args!("{}", dt.format("%Y%m%d-%H:%M:%S%.3f")),
        );
        buf
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            nanos_since_epoch: dt.timestamp_nanos_opt().unwrap_or(0) as u64,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_millis())
    }
}

/// Component identifier for FIX sessions.
///
/// Used for SenderCompID (tag 49) and TargetCompID (tag 56). Stored inline
/// with a fixed capacity so session identity never allocates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct CompId(ArrayString<COMP_ID_MAX_LEN>);

impl CompId {
    /// Creates a new CompId from a string slice.
    ///
    /// Returns `None` if the string exceeds [`COMP_ID_MAX_LEN`] bytes.
    #[must_use]
    pub fn new(s: &str) -> Option<Self> {
        ArrayString::from(s).ok().map(Self)
    }

    /// Returns the CompId as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the length of the CompId in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the CompId is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for CompId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CompId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CompId {
    type Err = arrayvec::CapacityError<()>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArrayString::try_from(s)
            .map(Self)
            .map_err(|_| arrayvec::CapacityError::new(()))
    }
}

/// Protocol version token carried in tag 8.
///
/// The variants are ordered by protocol age, so range comparisons such as
/// `begin_string >= BeginString::Fix42` follow the FIX version ordering. The
/// ordering matters to the session layer: the EndSeqNo sentinel in a
/// ResendRequest changed meaning at FIX.4.2.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum BeginString {
    /// FIX.4.0
    Fix40,
    /// FIX.4.1
    Fix41,
    /// FIX.4.2
    Fix42,
    /// FIX.4.3
    Fix43,
    /// FIX.4.4
    #[default]
    Fix44,
    /// FIXT.1.1 (transport for FIX 5.0 and later)
    Fixt11,
}

impl BeginString {
    /// Returns the wire representation of this version token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fix40 => "FIX.4.0",
            Self::Fix41 => "FIX.4.1",
            Self::Fix42 => "FIX.4.2",
            Self::Fix43 => "FIX.4.3",
            Self::Fix44 => "FIX.4.4",
            Self::Fixt11 => "FIXT.1.1",
        }
    }

    /// Returns true for FIXT.1.1 sessions, which carry an application
    /// version (tag 1128) on Logon.
    #[must_use]
    pub const fn is_fixt(self) -> bool {
        matches!(self, Self::Fixt11)
    }
}

impl FromStr for BeginString {
    type Err = UnknownBeginString;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIX.4.0" => Ok(Self::Fix40),
            "FIX.4.1" => Ok(Self::Fix41),
            "FIX.4.2" => Ok(Self::Fix42),
            "FIX.4.3" => Ok(Self::Fix43),
            "FIX.4.4" => Ok(Self::Fix44),
            "FIXT.1.1" => Ok(Self::Fixt11),
            other => Err(UnknownBeginString(other.to_string())),
        }
    }
}

impl fmt::Display for BeginString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unrecognized BeginString value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBeginString(pub String);

impl fmt::Display for UnknownBeginString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown begin string: {}", self.0)
    }
}

impl std::error::Error for UnknownBeginString {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_num_operations() {
        let seq = SeqNum::new(5);
        assert_eq!(seq.value(), 5);
        assert_eq!(seq.next().value(), 6);
        assert!(seq.is_valid());
        assert!(!SeqNum::new(0).is_valid());
    }

    #[test]
    fn test_seq_num_default() {
        assert_eq!(SeqNum::default().value(), 1);
    }

    #[test]
    fn test_timestamp_conversions() {
        let ts = Timestamp::from_millis(1000);
        assert_eq!(ts.as_millis(), 1000);
        assert_eq!(ts.as_nanos(), 1_000_000_000);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = Timestamp::from_millis(0);
        assert!(ts.format_millis().starts_with("19700101-00:00:00"));
    }

    #[test]
    fn test_timestamp_parse_round_trip() {
        let ts = Timestamp::from_millis(1_700_000_123_456);
        let parsed = Timestamp::parse_fix(ts.format_millis().as_str()).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn test_timestamp_parse_without_fraction() {
        let ts = Timestamp::parse_fix("20240102-03:04:05").unwrap();
        assert!(ts.format_millis().starts_with("20240102-03:04:05"));
    }

    #[test]
    fn test_timestamp_parse_invalid() {
        assert!(Timestamp::parse_fix("not a timestamp").is_none());
        assert!(Timestamp::parse_fix("2024-01-02 03:04:05").is_none());
    }

    #[test]
    fn test_timestamp_abs_delta() {
        let a = Timestamp::from_millis(1_000);
        let b = Timestamp::from_millis(3_500);
        assert_eq!(a.abs_delta(b), Duration::from_millis(2_500));
        assert_eq!(b.abs_delta(a), Duration::from_millis(2_500));
    }

    #[test]
    fn test_comp_id() {
        let id = CompId::new("SENDER").unwrap();
        assert_eq!(id.as_str(), "SENDER");
        assert_eq!(id.len(), 6);
        assert!(!id.is_empty());
    }

    #[test]
    fn test_comp_id_too_long() {
        let long = "A".repeat(COMP_ID_MAX_LEN + 1);
        assert!(CompId::new(&long).is_none());
    }

    #[test]
    fn test_begin_string_round_trip() {
        for bs in [
            BeginString::Fix40,
            BeginString::Fix41,
            BeginString::Fix42,
            BeginString::Fix43,
            BeginString::Fix44,
            BeginString::Fixt11,
        ] {
            assert_eq!(bs.as_str().parse::<BeginString>().unwrap(), bs);
        }
        assert!("FIX.9.9".parse::<BeginString>().is_err());
    }

    #[test]
    fn test_begin_string_ordering() {
        assert!(BeginString::Fix40 < BeginString::Fix42);
        assert!(BeginString::Fix42 >= BeginString::Fix42);
        assert!(BeginString::Fix44 > BeginString::Fix42);
        assert!(BeginString::Fixt11 > BeginString::Fix44);
    }

    #[test]
    fn test_begin_string_is_fixt() {
        assert!(BeginString::Fixt11.is_fixt());
        assert!(!BeginString::Fix44.is_fixt());
    }
}
