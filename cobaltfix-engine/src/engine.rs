/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! The engine: spawns session loops and keeps the registry current.

use crate::registry::SessionRegistry;
use bytes::Bytes;
use cobaltfix_session::application::Application;
use cobaltfix_session::config::SessionConfig;
use cobaltfix_session::dispatcher::{SessionHandle, spawn};
use cobaltfix_session::session::Session;
use cobaltfix_store::MessageStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// A running engine: shared application, session registry, and the session
/// configurations it was built with.
#[derive(Debug)]
pub struct Engine<A: Application> {
    application: Arc<A>,
    registry: Arc<SessionRegistry>,
    configs: Vec<SessionConfig>,
}

impl<A: Application> Engine<A> {
    pub(crate) fn new(
        application: Arc<A>,
        registry: Arc<SessionRegistry>,
        configs: Vec<SessionConfig>,
    ) -> Self {
        Self {
            application,
            registry,
            configs,
        }
    }

    /// Returns the session registry.
    #[must_use]
    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Returns the shared application handler.
    #[must_use]
    pub fn application(&self) -> Arc<A> {
        Arc::clone(&self.application)
    }

    /// Returns the session configurations the engine was built with.
    #[must_use]
    pub fn configs(&self) -> &[SessionConfig] {
        &self.configs
    }
}

impl<A: Application + 'static> Engine<A> {
    /// Spawns the event loop for one session and registers its handle.
    ///
    /// The caller owns the transport: `outbound` receives every frame the
    /// session emits, and inbound frames are delivered through the returned
    /// handle. When the loop ends the caller should [`SessionRegistry::unregister`]
    /// the identity.
    pub async fn start_session<S: MessageStore + 'static>(
        &self,
        config: SessionConfig,
        store: Arc<S>,
        outbound: mpsc::UnboundedSender<Bytes>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let session = Session::new(config, store, Arc::clone(&self.application), outbound).await;
        info!(session = %session.session_id(), "starting session");
        let (handle, join) = spawn(session);
        self.registry.register(handle.clone());
        (handle, join)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::EngineBuilder;
    use cobaltfix_core::types::{BeginString, CompId};
    use cobaltfix_store::MemoryStore;

    #[tokio::test]
    async fn test_start_session_registers_handle() {
        let config = SessionConfig::new(
            BeginString::Fix44,
            CompId::new("ISLD").unwrap(),
            CompId::new("TW").unwrap(),
        );
        let engine = EngineBuilder::new().add_session(config.clone()).build();

        let (tx, _rx) = mpsc::unbounded_channel();
        let (handle, _join) = engine
            .start_session(config.clone(), Arc::new(MemoryStore::new()), tx)
            .await;

        let registry = engine.registry();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(&config.session_id()).unwrap().session_id(),
            handle.session_id()
        );
    }
}
