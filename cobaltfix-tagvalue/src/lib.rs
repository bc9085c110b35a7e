/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # CobaltFIX Tag-Value
//!
//! Zero-copy FIX tag=value encoding and decoding for the CobaltFIX engine.
//!
//! This crate provides parsing and serialization of FIX messages in the
//! standard tag=value format with SOH (0x01) delimiters:
//!
//! - [`Decoder`]: zero-copy parser producing [`RawMessage`] views
//! - [`Encoder`]: low-level serializer handling BeginString, BodyLength, and
//!   CheckSum framing
//! - [`MessageBuilder`]: the outbound message builder that the session layer
//!   stamps and freezes into canonical bytes
//! - [`checksum`]: modulo-256 checksum helpers

pub mod builder;
pub mod checksum;
pub mod decoder;
pub mod encoder;

pub use builder::MessageBuilder;
pub use checksum::calculate_checksum;
pub use cobaltfix_core::message::RawMessage;
pub use decoder::Decoder;
pub use encoder::Encoder;
