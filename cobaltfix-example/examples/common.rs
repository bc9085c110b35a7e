//! Common utilities shared across examples.

#![allow(dead_code)]

use std::env;

/// Default server port.
pub const DEFAULT_PORT: u16 = 9876;

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Example configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ExampleConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Sender CompID.
    pub sender_comp_id: String,
    /// Target CompID.
    pub target_comp_id: String,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval: u64,
    /// Optional directory for file-backed session stores.
    pub store_dir: Option<String>,
}

impl ExampleConfig {
    /// Creates a new configuration for an initiator.
    #[must_use]
    pub fn initiator() -> Self {
        Self::load("CLIENT", "SERVER")
    }

    /// Creates a new configuration for an acceptor.
    #[must_use]
    pub fn acceptor() -> Self {
        Self::load("SERVER", "CLIENT")
    }

    fn load(default_sender: &str, default_target: &str) -> Self {
        Self {
            host: env::var("FIX_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("FIX_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            sender_comp_id: env::var("FIX_SENDER").unwrap_or_else(|_| default_sender.to_string()),
            target_comp_id: env::var("FIX_TARGET").unwrap_or_else(|_| default_target.to_string()),
            heartbeat_interval: env::var("FIX_HEARTBEAT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            store_dir: env::var("FIX_STORE_DIR").ok(),
        }
    }

    /// Returns the socket address string.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Initializes logging for examples.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}
