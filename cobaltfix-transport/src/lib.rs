/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # CobaltFIX Transport
//!
//! FIX message framing over byte streams.
//!
//! This crate provides [`FixCodec`], a tokio codec that cuts complete FIX
//! frames out of a TCP stream using the BeginString/BodyLength/CheckSum
//! framing invariants. Decoded frames are raw bytes; parsing into a message
//! is the tag-value layer's job, and session semantics live upstream in the
//! session crate.

pub mod codec;

pub use codec::{CodecError, FixCodec};
