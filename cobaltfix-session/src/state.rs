/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session states.
//!
//! The session lives in exactly one of these states; every inbound message
//! and timer event is interpreted by the current state, and handlers return
//! the next one. The set is closed on purpose: new behavior belongs in the
//! per-state handlers on `Session`, not in new states.

use std::fmt;

/// The session state machine's states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// No logical session. Only an inbound Logon is meaningful.
    #[default]
    Latent,
    /// Logon sent by the initiator; awaiting the counterparty Logon.
    LogonPending,
    /// Session established; full administrative and application handling.
    InSession,
    /// A sequence gap was detected; a ResendRequest is outstanding and
    /// out-of-order inbound messages are stashed.
    Resend,
    /// The peer has been silent past the heartbeat window; a TestRequest is
    /// outstanding.
    PendingTimeout,
    /// Logout sent; awaiting the peer's Logout or the grace timer.
    Logout,
}

impl State {
    /// Returns true once a logon handshake has completed and the session has
    /// not yet returned to latent.
    #[must_use]
    pub const fn is_logged_on(self) -> bool {
        matches!(
            self,
            Self::InSession | Self::Resend | Self::PendingTimeout | Self::Logout
        )
    }

    /// Returns true while the session is exchanging application traffic.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::InSession | Self::Resend | Self::PendingTimeout)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Latent => "latent",
            Self::LogonPending => "logon pending",
            Self::InSession => "in session",
            Self::Resend => "resend",
            Self::PendingTimeout => "pending timeout",
            Self::Logout => "logout",
        };
        write!(f, "{name}")
    }
}

/// Outcome of a state handler: either the next state, or an instruction to
/// drop the transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move to (or remain in) the given state.
    Next(State),
    /// Tear the connection down; the session object returns to latent.
    Disconnect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(!State::Latent.is_logged_on());
        assert!(!State::LogonPending.is_logged_on());
        assert!(State::InSession.is_logged_on());
        assert!(State::Resend.is_active());
        assert!(State::PendingTimeout.is_active());
        assert!(State::Logout.is_logged_on());
        assert!(!State::Logout.is_active());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(State::InSession.to_string(), "in session");
        assert_eq!(State::PendingTimeout.to_string(), "pending timeout");
    }
}
