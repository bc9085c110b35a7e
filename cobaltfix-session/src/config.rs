/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session configuration.

use crate::application::SessionId;
use cobaltfix_core::types::{BeginString, CompId};
use std::time::Duration;

/// Configuration for a single FIX session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Protocol version (tag 8).
    pub begin_string: BeginString,
    /// Our CompID (tag 49 on outbound messages).
    pub sender_comp_id: CompId,
    /// Counterparty CompID (tag 56 on outbound messages).
    pub target_comp_id: CompId,
    /// Optional session qualifier.
    pub session_qualifier: Option<String>,
    /// Heartbeat interval; also drives the peer-inactivity window.
    pub heartbeat_interval: Duration,
    /// Accepted deviation between an inbound SendingTime and the local clock.
    pub sending_time_tolerance: Duration,
    /// How long an initiator waits for the counterparty Logon.
    pub logon_timeout: Duration,
    /// Grace period after sending Logout before dropping the connection.
    pub logout_timeout: Duration,
    /// Whether to reset sequence numbers when initiating a logon.
    pub reset_on_logon: bool,
    /// Whether to reset sequence numbers when the session disconnects.
    pub reset_on_disconnect: bool,
    /// DefaultApplVerID (tag 1128) for FIXT.1.1 Logon messages.
    pub default_appl_ver_id: Option<String>,
    /// Maximum inbound frame size accepted by the transport.
    pub max_message_size: usize,
    /// Whether the transport validates inbound checksums.
    pub validate_checksum: bool,
}

impl SessionConfig {
    /// Creates a configuration with defaults for everything but identity.
    #[must_use]
    pub fn new(begin_string: BeginString, sender_comp_id: CompId, target_comp_id: CompId) -> Self {
        Self {
            begin_string,
            sender_comp_id,
            target_comp_id,
            session_qualifier: None,
            heartbeat_interval: Duration::from_secs(30),
            sending_time_tolerance: Duration::from_secs(120),
            logon_timeout: Duration::from_secs(10),
            logout_timeout: Duration::from_secs(2),
            reset_on_logon: false,
            reset_on_disconnect: false,
            default_appl_ver_id: None,
            max_message_size: 1024 * 1024,
            validate_checksum: true,
        }
    }

    /// Returns the session identity for this configuration.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        let id = SessionId::new(
            self.begin_string,
            self.sender_comp_id.clone(),
            self.target_comp_id.clone(),
        );
        match &self.session_qualifier {
            Some(q) => id.with_qualifier(q.clone()),
            None => id,
        }
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the SendingTime tolerance window.
    #[must_use]
    pub fn with_sending_time_tolerance(mut self, tolerance: Duration) -> Self {
        self.sending_time_tolerance = tolerance;
        self
    }

    /// Sets the logon grace period.
    #[must_use]
    pub fn with_logon_timeout(mut self, timeout: Duration) -> Self {
        self.logon_timeout = timeout;
        self
    }

    /// Sets the logout grace period.
    #[must_use]
    pub fn with_logout_timeout(mut self, timeout: Duration) -> Self {
        self.logout_timeout = timeout;
        self
    }

    /// Sets whether to reset sequence numbers on logon.
    #[must_use]
    pub const fn with_reset_on_logon(mut self, reset: bool) -> Self {
        self.reset_on_logon = reset;
        self
    }

    /// Sets the DefaultApplVerID for FIXT.1.1 sessions.
    #[must_use]
    pub fn with_default_appl_ver_id(mut self, ver: impl Into<String>) -> Self {
        self.default_appl_ver_id = Some(ver.into());
        self
    }

    /// Sets the session qualifier.
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.session_qualifier = Some(qualifier.into());
        self
    }
}

/// Builder for session configuration.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    begin_string: Option<BeginString>,
    sender_comp_id: Option<CompId>,
    target_comp_id: Option<CompId>,
    heartbeat_interval: Option<Duration>,
    logout_timeout: Option<Duration>,
    reset_on_logon: bool,
}

impl SessionConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the protocol version.
    #[must_use]
    pub const fn begin_string(mut self, begin_string: BeginString) -> Self {
        self.begin_string = Some(begin_string);
        self
    }

    /// Sets the sender CompID.
    #[must_use]
    pub fn sender_comp_id(mut self, id: CompId) -> Self {
        self.sender_comp_id = Some(id);
        self
    }

    /// Sets the target CompID.
    #[must_use]
    pub fn target_comp_id(mut self, id: CompId) -> Self {
        self.target_comp_id = Some(id);
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub const fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    /// Sets the logout grace period.
    #[must_use]
    pub const fn logout_timeout(mut self, timeout: Duration) -> Self {
        self.logout_timeout = Some(timeout);
        self
    }

    /// Sets whether to reset on logon.
    #[must_use]
    pub const fn reset_on_logon(mut self, reset: bool) -> Self {
        self.reset_on_logon = reset;
        self
    }

    /// Builds the configuration.
    ///
    /// # Panics
    /// Panics if the CompIDs are not set.
    #[must_use]
    pub fn build(self) -> SessionConfig {
        let sender = self.sender_comp_id.expect("sender_comp_id is required");
        let target = self.target_comp_id.expect("target_comp_id is required");
        let begin_string = self.begin_string.unwrap_or_default();

        let mut config = SessionConfig::new(begin_string, sender, target);
        if let Some(interval) = self.heartbeat_interval {
            config.heartbeat_interval = interval;
        }
        if let Some(timeout) = self.logout_timeout {
            config.logout_timeout = timeout;
        }
        config.reset_on_logon = self.reset_on_logon;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp(s: &str) -> CompId {
        CompId::new(s).unwrap()
    }

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::new(BeginString::Fix44, comp("SENDER"), comp("TARGET"));

        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.sending_time_tolerance, Duration::from_secs(120));
        assert_eq!(config.logout_timeout, Duration::from_secs(2));
        assert!(!config.reset_on_logon);
        assert!(config.validate_checksum);
        assert_eq!(config.session_id().to_string(), "FIX.4.4:SENDER->TARGET");
    }

    #[test]
    fn test_session_config_builder() {
        let config = SessionConfigBuilder::new()
            .begin_string(BeginString::Fix42)
            .sender_comp_id(comp("ISLD"))
            .target_comp_id(comp("TW"))
            .heartbeat_interval(Duration::from_secs(60))
            .logout_timeout(Duration::from_secs(5))
            .reset_on_logon(true)
            .build();

        assert_eq!(config.begin_string, BeginString::Fix42);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(60));
        assert_eq!(config.logout_timeout, Duration::from_secs(5));
        assert!(config.reset_on_logon);
    }
}
