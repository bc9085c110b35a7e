/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # CobaltFIX Core
//!
//! Core types, message model, and error taxonomy for the CobaltFIX session engine.
//!
//! This crate provides the building blocks shared by every other CobaltFIX crate:
//! - **Error types**: unified error handling with `thiserror`
//! - **Field model**: `FieldTag` and the zero-copy `FieldRef`
//! - **Message model**: `RawMessage` (zero-copy) and `OwnedMessage` (owned)
//! - **Core types**: `SeqNum`, `Timestamp`, `CompId`, `BeginString`
//! - **Tag constants**: the session-layer tag numbers in [`tags`]
//!
//! ## Zero-Copy Design
//!
//! Inbound messages are parsed into borrowed views for hot-path processing and
//! promoted to owned representations only when they cross a task boundary or
//! are stashed for later delivery.

pub mod error;
pub mod field;
pub mod message;
pub mod tags;
pub mod types;

pub use error::{DecodeError, EncodeError, FixError, Result, SessionError, StoreError};
pub use field::{FieldRef, FieldTag};
pub use message::{MsgType, OwnedMessage, RawMessage};
pub use types::{BeginString, CompId, SeqNum, Timestamp};
