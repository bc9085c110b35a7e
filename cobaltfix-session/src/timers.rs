/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session liveness deadlines.
//!
//! One monotonic clock, three deadlines:
//!
//! - **heartbeat**: `last send + interval`, time to emit a Heartbeat
//! - **peer**: `last receive + interval`, the counterparty has gone quiet;
//!   after a TestRequest goes out the window is re-armed to 1.2x from that
//!   moment, and a second expiry means the connection is dead
//! - **state**: one-shot grace deadline shared by the logon and logout
//!   handshakes
//!
//! The deadlines never fire callbacks themselves. The session loop asks for
//! the earliest pending deadline each iteration and sleeps on it, so expiry
//! is just another event in the loop and cancellation cannot race a firing
//! timer.

use std::time::Duration;
use tokio::time::Instant;

/// Factor applied to the peer window after a TestRequest has been sent.
const EXTENDED_WINDOW_FACTOR: f64 = 1.2;

/// Timer events surfaced to the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Nothing has been sent for a full heartbeat interval.
    NeedHeartbeat,
    /// Nothing has been received for the current peer window.
    PeerTimeout,
    /// The one-shot logon/logout grace deadline expired.
    StateTimeout,
}

/// Deadline bookkeeping for one session.
#[derive(Debug)]
pub struct SessionTimers {
    /// Heartbeat interval; also the base peer window.
    interval: Duration,
    /// Whether the send/receive deadlines are armed (only while logged on).
    enabled: bool,
    /// Instant of the last outbound message.
    last_sent: Instant,
    /// Instant of the last inbound message (or of the TestRequest that
    /// extended the window).
    last_received: Instant,
    /// True once the peer window has been extended to 1.2x.
    peer_window_extended: bool,
    /// One-shot grace deadline.
    state_deadline: Option<Instant>,
}

impl SessionTimers {
    /// Creates disabled timers with the given heartbeat interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            interval,
            enabled: false,
            last_sent: now,
            last_received: now,
            peer_window_extended: false,
            state_deadline: None,
        }
    }

    /// Returns the heartbeat interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Changes the heartbeat interval (renegotiated at logon).
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Arms the send/receive deadlines, starting both windows now.
    pub fn enable(&mut self) {
        let now = Instant::now();
        self.enabled = true;
        self.last_sent = now;
        self.last_received = now;
        self.peer_window_extended = false;
    }

    /// Disarms the send/receive deadlines and clears the grace deadline.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.peer_window_extended = false;
        self.state_deadline = None;
    }

    /// Records an outbound message, pushing the heartbeat deadline out.
    pub fn on_message_sent(&mut self) {
        self.last_sent = Instant::now();
    }

    /// Records an inbound message, pushing the peer deadline out and
    /// restoring the normal window.
    pub fn on_message_received(&mut self) {
        self.last_received = Instant::now();
        self.peer_window_extended = false;
    }

    /// Re-arms the peer window to 1.2x the interval from now. Called after a
    /// TestRequest has been sent; the next expiry is final.
    pub fn extend_peer_window(&mut self) {
        self.last_received = Instant::now();
        self.peer_window_extended = true;
    }

    /// Arms the one-shot grace deadline.
    pub fn arm_state_timeout(&mut self, after: Duration) {
        self.state_deadline = Some(Instant::now() + after);
    }

    /// Clears the one-shot grace deadline.
    pub fn clear_state_timeout(&mut self) {
        self.state_deadline = None;
    }

    /// Returns the earliest pending deadline and the event it stands for,
    /// or `None` when nothing is armed.
    #[must_use]
    pub fn next_deadline(&self) -> Option<(Instant, TimerEvent)> {
        let mut next: Option<(Instant, TimerEvent)> = self
            .state_deadline
            .map(|at| (at, TimerEvent::StateTimeout));

        if self.enabled {
            let heartbeat_at = self.last_sent + self.interval;
            let peer_window = if self.peer_window_extended {
                self.interval.mul_f64(EXTENDED_WINDOW_FACTOR)
            } else {
                self.interval
            };
            let peer_at = self.last_received + peer_window;

            for candidate in [
                (heartbeat_at, TimerEvent::NeedHeartbeat),
                (peer_at, TimerEvent::PeerTimeout),
            ] {
                next = match next {
                    Some(current) if current.0 <= candidate.0 => Some(current),
                    _ => Some(candidate),
                };
            }
        }

        next
    }

    /// Acknowledges a fired event, clearing one-shot state.
    pub fn fire(&mut self, event: TimerEvent) {
        if event == TimerEvent::StateTimeout {
            self.state_deadline = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{self, Duration};

    #[tokio::test(start_paused = true)]
    async fn test_disabled_timers_have_no_deadline() {
        let timers = SessionTimers::new(Duration::from_secs(30));
        assert!(timers.next_deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_deadline_fires_first_when_traffic_received() {
        let mut timers = SessionTimers::new(Duration::from_secs(30));
        timers.enable();

        // Inbound traffic keeps the peer window fresh; the heartbeat deadline
        // is now the earliest.
        time::advance(Duration::from_secs(10)).await;
        timers.on_message_received();

        let (at, event) = timers.next_deadline().unwrap();
        assert_eq!(event, TimerEvent::NeedHeartbeat);
        assert!(at <= Instant::now() + Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_peer_deadline_fires_when_sending_but_not_receiving() {
        let mut timers = SessionTimers::new(Duration::from_secs(30));
        timers.enable();

        time::advance(Duration::from_secs(10)).await;
        timers.on_message_sent();

        let (_, event) = timers.next_deadline().unwrap();
        assert_eq!(event, TimerEvent::PeerTimeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extended_peer_window() {
        let mut timers = SessionTimers::new(Duration::from_secs(10));
        timers.enable();
        timers.on_message_sent();
        timers.extend_peer_window();
        timers.on_message_sent();

        // With the 1.2x factor the peer deadline lands at 12s, after the 10s
        // heartbeat deadline.
        let (_, event) = timers.next_deadline().unwrap();
        assert_eq!(event, TimerEvent::NeedHeartbeat);

        // Receiving traffic restores the normal window.
        timers.on_message_received();
        time::advance(Duration::from_secs(11)).await;
        timers.on_message_sent();
        let (at, event) = timers.next_deadline().unwrap();
        assert_eq!(event, TimerEvent::PeerTimeout);
        assert!(at <= Instant::now());
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_deadline_beats_liveness_deadlines() {
        let mut timers = SessionTimers::new(Duration::from_secs(30));
        timers.enable();
        timers.arm_state_timeout(Duration::from_secs(2));

        let (_, event) = timers.next_deadline().unwrap();
        assert_eq!(event, TimerEvent::StateTimeout);

        timers.fire(TimerEvent::StateTimeout);
        let (_, event) = timers.next_deadline().unwrap();
        assert_ne!(event, TimerEvent::StateTimeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_deadline_armed_while_disabled() {
        let mut timers = SessionTimers::new(Duration::from_secs(30));
        timers.arm_state_timeout(Duration::from_secs(5));

        let (_, event) = timers.next_deadline().unwrap();
        assert_eq!(event, TimerEvent::StateTimeout);

        timers.clear_state_timeout();
        assert!(timers.next_deadline().is_none());
    }
}
