/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Application callback interface.
//!
//! The session layer drives an [`Application`] implementation for every
//! lifecycle event and message crossing the session boundary. Callbacks run
//! on the session task and must return promptly; anything expensive belongs
//! on a channel to a worker task.

use async_trait::async_trait;
use cobaltfix_core::message::OwnedMessage;
use cobaltfix_core::types::{BeginString, CompId};
use cobaltfix_tagvalue::MessageBuilder;

/// Session identifier: protocol version plus the two CompIDs, with an
/// optional qualifier to distinguish parallel sessions between the same
/// counterparties.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    /// Protocol version (tag 8).
    pub begin_string: BeginString,
    /// Our CompID (tag 49 on outbound messages).
    pub sender_comp_id: CompId,
    /// Counterparty CompID (tag 56 on outbound messages).
    pub target_comp_id: CompId,
    /// Optional qualifier.
    pub qualifier: Option<String>,
}

impl SessionId {
    /// Creates a new session id without a qualifier.
    #[must_use]
    pub fn new(begin_string: BeginString, sender_comp_id: CompId, target_comp_id: CompId) -> Self {
        Self {
            begin_string,
            sender_comp_id,
            target_comp_id,
            qualifier: None,
        }
    }

    /// Sets the qualifier.
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Returns a filesystem-friendly key for this session, used by persistent
    /// stores: `FIX.4.4-SENDER-TARGET` (plus `-qualifier` when present).
    #[must_use]
    pub fn storage_key(&self) -> String {
        match &self.qualifier {
            Some(q) => format!(
                "{}-{}-{}-{}",
                self.begin_string, self.sender_comp_id, self.target_comp_id, q
            ),
            None => format!(
                "{}-{}-{}",
                self.begin_string, self.sender_comp_id, self.target_comp_id
            ),
        }
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}->{}",
            self.begin_string, self.sender_comp_id, self.target_comp_id
        )?;
        if let Some(q) = &self.qualifier {
            write!(f, ":{q}")?;
        }
        Ok(())
    }
}

/// Reason an application rejects an inbound message.
///
/// Converted by the session into a session-level Reject (MsgType 3).
#[derive(Debug, Clone)]
pub struct RejectReason {
    /// SessionRejectReason code (tag 373).
    pub code: u32,
    /// Human-readable rejection text (tag 58).
    pub text: String,
    /// Tag that caused the rejection (tag 371), if any.
    pub ref_tag: Option<u32>,
}

impl RejectReason {
    /// Creates a new rejection reason.
    #[must_use]
    pub fn new(code: u32, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
            ref_tag: None,
        }
    }

    /// Sets the reference tag.
    #[must_use]
    pub const fn with_ref_tag(mut self, tag: u32) -> Self {
        self.ref_tag = Some(tag);
        self
    }
}

/// Marker returned by [`Application::to_app`] to veto an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoNotSend;

/// Application callback interface.
#[async_trait]
pub trait Application: Send + Sync {
    /// Called when a session object is created.
    async fn on_create(&self, session_id: &SessionId);

    /// Called when the session is established.
    async fn on_logon(&self, session_id: &SessionId);

    /// Called when the session ends, whether by logout handshake or
    /// disconnect.
    async fn on_logout(&self, session_id: &SessionId);

    /// Called before an administrative message is stamped and sent. The
    /// builder may be modified in place (e.g. to add credentials to a Logon).
    async fn to_admin(&self, message: &mut MessageBuilder, session_id: &SessionId);

    /// Called when a verified administrative message arrives.
    ///
    /// # Errors
    /// Return a [`RejectReason`] to reject the message at session level.
    #[allow(clippy::wrong_self_convention)]
    async fn from_admin(
        &self,
        message: &OwnedMessage,
        session_id: &SessionId,
    ) -> Result<(), RejectReason>;

    /// Called before an application message is stamped and sent.
    ///
    /// # Errors
    /// Return [`DoNotSend`] to drop the message without sending.
    async fn to_app(
        &self,
        message: &mut MessageBuilder,
        session_id: &SessionId,
    ) -> Result<(), DoNotSend>;

    /// Called when a verified application message arrives.
    ///
    /// # Errors
    /// Return a [`RejectReason`] to reject the message at session level.
    #[allow(clippy::wrong_self_convention)]
    async fn from_app(
        &self,
        message: &OwnedMessage,
        session_id: &SessionId,
    ) -> Result<(), RejectReason>;
}

/// Default no-op application implementation.
#[derive(Debug, Default)]
pub struct NoOpApplication;

#[async_trait]
impl Application for NoOpApplication {
    async fn on_create(&self, _session_id: &SessionId) {}

    async fn on_logon(&self, _session_id: &SessionId) {}

    async fn on_logout(&self, _session_id: &SessionId) {}

    async fn to_admin(&self, _message: &mut MessageBuilder, _session_id: &SessionId) {}

    async fn from_admin(
        &self,
        _message: &OwnedMessage,
        _session_id: &SessionId,
    ) -> Result<(), RejectReason> {
        Ok(())
    }

    async fn to_app(
        &self,
        _message: &mut MessageBuilder,
        _session_id: &SessionId,
    ) -> Result<(), DoNotSend> {
        Ok(())
    }

    async fn from_app(
        &self,
        _message: &OwnedMessage,
        _session_id: &SessionId,
    ) -> Result<(), RejectReason> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp(s: &str) -> CompId {
        CompId::new(s).unwrap()
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new(BeginString::Fix44, comp("SENDER"), comp("TARGET"));
        assert_eq!(id.to_string(), "FIX.4.4:SENDER->TARGET");

        let qualified = id.clone().with_qualifier("primary");
        assert_eq!(qualified.to_string(), "FIX.4.4:SENDER->TARGET:primary");
    }

    #[test]
    fn test_session_id_storage_key() {
        let id = SessionId::new(BeginString::Fix42, comp("A"), comp("B"));
        assert_eq!(id.storage_key(), "FIX.4.2-A-B");
        assert_eq!(
            id.with_qualifier("x").storage_key(),
            "FIX.4.2-A-B-x"
        );
    }

    #[test]
    fn test_reject_reason() {
        let reason = RejectReason::new(5, "bad value").with_ref_tag(36);
        assert_eq!(reason.code, 5);
        assert_eq!(reason.text, "bad value");
        assert_eq!(reason.ref_tag, Some(36));
    }

    #[tokio::test]
    async fn test_noop_application() {
        let app = NoOpApplication;
        let id = SessionId::new(BeginString::Fix44, comp("S"), comp("T"));

        app.on_create(&id).await;
        app.on_logon(&id).await;
        app.on_logout(&id).await;
    }
}
