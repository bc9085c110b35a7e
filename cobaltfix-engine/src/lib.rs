/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # CobaltFIX Engine
//!
//! High-level facade over the CobaltFIX session layer.
//!
//! This crate provides:
//! - **Registry**: the process-wide map from session identity to its running
//!   event loop handle
//! - **Builder API**: fluent configuration of an engine and its sessions
//! - **Engine**: spawns session loops and wires them to the registry
//!
//! Transport wiring (TCP accept/connect loops) stays outside the engine: the
//! caller connects a socket, hands the engine an outbound byte channel, and
//! pumps decoded frames into the returned session handle.

pub mod builder;
pub mod engine;
pub mod registry;

pub use builder::EngineBuilder;
pub use engine::Engine;
pub use registry::SessionRegistry;
