/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Process-wide session registry.
//!
//! One registry per engine maps each [`SessionId`] to the handle of its
//! running event loop, letting application code address a session by
//! identity without holding the handle itself.

use cobaltfix_core::error::SessionError;
use cobaltfix_session::application::SessionId;
use cobaltfix_session::dispatcher::SessionHandle;
use cobaltfix_tagvalue::MessageBuilder;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Registry of live sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session handle, returning the handle it replaced, if any.
    pub fn register(&self, handle: SessionHandle) -> Option<SessionHandle> {
        self.sessions
            .write()
            .insert(handle.session_id().clone(), handle)
    }

    /// Removes a session from the registry.
    pub fn unregister(&self, session_id: &SessionId) -> Option<SessionHandle> {
        self.sessions.write().remove(session_id)
    }

    /// Looks up the handle for a session.
    #[must_use]
    pub fn get(&self, session_id: &SessionId) -> Option<SessionHandle> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Returns the identities of all registered sessions.
    #[must_use]
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Returns the number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns true when no sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Queues a message for sending on the identified session.
    ///
    /// # Errors
    /// Returns `SessionError::UnknownSession` if no session is registered
    /// under the identity, or `SessionError::Terminated` if its loop exited.
    pub async fn send_to(
        &self,
        session_id: &SessionId,
        builder: MessageBuilder,
    ) -> Result<(), SessionError> {
        let handle = self
            .get(session_id)
            .ok_or_else(|| SessionError::UnknownSession {
                session_id: session_id.to_string(),
            })?;
        handle.send(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobaltfix_core::types::{BeginString, CompId};
    use cobaltfix_session::application::NoOpApplication;
    use cobaltfix_session::config::SessionConfig;
    use cobaltfix_session::dispatcher::spawn;
    use cobaltfix_session::session::Session;
    use cobaltfix_store::MemoryStore;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    async fn test_handle(sender: &str) -> SessionHandle {
        let config = SessionConfig::new(
            BeginString::Fix44,
            CompId::new(sender).unwrap(),
            CompId::new("TW").unwrap(),
        );
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = Session::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(NoOpApplication),
            tx,
        )
        .await;
        let (handle, _join) = spawn(session);
        handle
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty());

        let handle = test_handle("ISLD").await;
        let id = handle.session_id().clone();
        assert!(registry.register(handle).is_none());

        assert_eq!(registry.len(), 1);
        assert!(registry.get(&id).is_some());
        assert_eq!(registry.session_ids(), vec![id.clone()]);

        assert!(registry.unregister(&id).is_some());
        assert!(registry.get(&id).is_none());
    }

    #[tokio::test]
    async fn test_send_to_unknown_session() {
        let registry = SessionRegistry::new();
        let id = SessionId::new(
            BeginString::Fix44,
            CompId::new("NOBODY").unwrap(),
            CompId::new("TW").unwrap(),
        );
        let result = registry
            .send_to(
                &id,
                MessageBuilder::new(cobaltfix_core::message::MsgType::Heartbeat),
            )
            .await;
        assert!(matches!(result, Err(SessionError::UnknownSession { .. })));
    }
}
