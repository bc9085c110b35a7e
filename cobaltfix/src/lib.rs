/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # CobaltFIX
//!
//! A FIX session-layer protocol engine for Rust.
//!
//! CobaltFIX implements the session discipline of the FIX protocol
//! (sequence numbers, gap recovery, heartbeats, logon/logout negotiation,
//! and persistent message storage) for FIX 4.0 through FIXT.1.1. Application
//! payloads stay untyped: the engine dispatches on MsgType and hands
//! application messages to your callbacks.
//!
//! ## Design
//!
//! - **Zero-copy parsing**: inbound field values reference the frame buffer
//! - **One task per session**: all session state is owned by its event loop;
//!   no locks on the hot path
//! - **Store-before-send**: outbound messages are persisted under their
//!   sequence number before the bytes reach the transport, so resend
//!   requests are always answerable
//! - **Async throughout**: built on Tokio
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cobaltfix::prelude::*;
//!
//! let engine = EngineBuilder::new()
//!     .with_application(MyApplication)
//!     .add_session(SessionConfig::new(
//!         BeginString::Fix44,
//!         CompId::new("SENDER").unwrap(),
//!         CompId::new("TARGET").unwrap(),
//!     ))
//!     .build();
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: message model, field model, core types, error taxonomy
//! - [`tagvalue`]: tag=value decoding, encoding, and the outbound builder
//! - [`session`]: the session state machine and its event loop
//! - [`store`]: message persistence
//! - [`transport`]: FIX framing over byte streams
//! - [`engine`]: facade, registry, and session spawning

pub mod core {
    //! Message model, core types, and error taxonomy.
    pub use cobaltfix_core::*;
}

pub mod tagvalue {
    //! Tag=value decoding, encoding, and the outbound message builder.
    pub use cobaltfix_tagvalue::*;
}

pub mod session {
    //! Session state machine, verification, recovery, and dispatch.
    pub use cobaltfix_session::*;
}

pub mod store {
    //! Message persistence and sequence bookkeeping.
    pub use cobaltfix_store::*;
}

pub mod transport {
    //! FIX framing over byte streams.
    pub use cobaltfix_transport::*;
}

pub mod engine {
    //! High-level engine facade.
    pub use cobaltfix_engine::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use cobaltfix_core::{
        BeginString, CompId, DecodeError, EncodeError, FieldRef, FieldTag, FixError, MsgType,
        OwnedMessage, RawMessage, Result, SeqNum, SessionError, StoreError, Timestamp, tags,
    };

    pub use cobaltfix_tagvalue::{Decoder, Encoder, MessageBuilder, calculate_checksum};

    pub use cobaltfix_session::{
        Application, DoNotSend, NoOpApplication, RejectReason, SessionConfig, SessionEvent,
        SessionHandle, SessionId, State,
    };

    pub use cobaltfix_store::{FileStore, MemoryStore, MessageStore};

    pub use cobaltfix_transport::{CodecError, FixCodec};

    pub use cobaltfix_engine::{Engine, EngineBuilder, SessionRegistry};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        assert_eq!(SeqNum::new(1).next().value(), 2);
        assert_eq!(BeginString::Fix44.as_str(), "FIX.4.4");
        assert!(Timestamp::now().as_nanos() > 0);
    }

    #[test]
    fn test_admin_msg_types() {
        for admin in ["0", "1", "2", "3", "4", "5", "A"] {
            assert!(admin.parse::<MsgType>().unwrap().is_admin());
        }
        assert!("D".parse::<MsgType>().unwrap().is_app());
    }
}
