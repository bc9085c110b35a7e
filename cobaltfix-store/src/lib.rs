/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # CobaltFIX Store
//!
//! Message persistence and sequence-number bookkeeping for the CobaltFIX
//! engine.
//!
//! This crate provides:
//! - **MessageStore trait**: the contract the session layer replays against
//! - **MemoryStore**: in-memory store for tests and non-durable sessions
//! - **FileStore**: file-backed store that survives reconnects
//!
//! A store keeps every outbound message keyed by its MsgSeqNum, forming a
//! dense sequence `1..next_sender_seq`. Gap recovery depends on that density:
//! a ResendRequest is answered straight out of the store.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::MessageStore;
