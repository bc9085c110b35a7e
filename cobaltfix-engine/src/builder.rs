/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Engine builder for fluent configuration.

use crate::engine::Engine;
use crate::registry::SessionRegistry;
use cobaltfix_session::application::{Application, NoOpApplication};
use cobaltfix_session::config::SessionConfig;
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring a FIX engine.
#[derive(Debug)]
pub struct EngineBuilder<A: Application = NoOpApplication> {
    /// Application callback handler.
    application: Arc<A>,
    /// Session configurations.
    sessions: Vec<SessionConfig>,
    /// Connection timeout for initiators.
    connect_timeout: Duration,
    /// Delay between reconnect attempts.
    reconnect_interval: Duration,
    /// Maximum reconnect attempts before giving up.
    max_reconnect_attempts: u32,
}

impl Default for EngineBuilder<NoOpApplication> {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder<NoOpApplication> {
    /// Creates a new engine builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            application: Arc::new(NoOpApplication),
            sessions: Vec::new(),
            connect_timeout: Duration::from_secs(30),
            reconnect_interval: Duration::from_secs(5),
            max_reconnect_attempts: 10,
        }
    }
}

impl<A: Application> EngineBuilder<A> {
    /// Sets the application callback handler.
    #[must_use]
    pub fn with_application<B: Application>(self, application: B) -> EngineBuilder<B> {
        EngineBuilder {
            application: Arc::new(application),
            sessions: self.sessions,
            connect_timeout: self.connect_timeout,
            reconnect_interval: self.reconnect_interval,
            max_reconnect_attempts: self.max_reconnect_attempts,
        }
    }

    /// Adds a session configuration.
    #[must_use]
    pub fn add_session(mut self, config: SessionConfig) -> Self {
        self.sessions.push(config);
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the reconnect interval.
    #[must_use]
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Sets the maximum reconnect attempts.
    #[must_use]
    pub const fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Returns the configured sessions.
    #[must_use]
    pub fn sessions(&self) -> &[SessionConfig] {
        &self.sessions
    }

    /// Returns the connection timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the reconnect interval.
    #[must_use]
    pub const fn reconnect_interval(&self) -> Duration {
        self.reconnect_interval
    }

    /// Returns the maximum reconnect attempts.
    #[must_use]
    pub const fn max_reconnect_attempts(&self) -> u32 {
        self.max_reconnect_attempts
    }

    /// Builds the engine.
    #[must_use]
    pub fn build(self) -> Engine<A> {
        Engine::new(
            self.application,
            Arc::new(SessionRegistry::new()),
            self.sessions,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobaltfix_core::types::{BeginString, CompId};

    #[test]
    fn test_engine_builder_defaults() {
        let builder = EngineBuilder::new();
        assert_eq!(builder.connect_timeout(), Duration::from_secs(30));
        assert_eq!(builder.max_reconnect_attempts(), 10);
        assert!(builder.sessions().is_empty());
    }

    #[test]
    fn test_engine_builder_with_session() {
        let config = SessionConfig::new(
            BeginString::Fix44,
            CompId::new("SENDER").unwrap(),
            CompId::new("TARGET").unwrap(),
        );

        let builder = EngineBuilder::new()
            .add_session(config)
            .with_connect_timeout(Duration::from_secs(60));

        assert_eq!(builder.sessions().len(), 1);
        assert_eq!(builder.connect_timeout(), Duration::from_secs(60));

        let engine = builder.build();
        assert_eq!(engine.configs().len(), 1);
        assert!(engine.registry().is_empty());
    }
}
