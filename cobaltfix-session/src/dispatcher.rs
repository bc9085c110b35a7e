/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! The per-session event loop.
//!
//! Each session runs on its own task, which owns the [`Session`] exclusively.
//! The loop multiplexes a single event channel (inbound parsed messages from
//! the transport reader, application send requests, logon/logout requests)
//! against the earliest timer deadline. Nothing else ever touches the
//! session, so handlers need no locks and timer cancellation cannot race a
//! firing deadline.
//!
//! Inbound frames are decoded by the transport layer and delivered here as
//! [`OwnedMessage`] values. Outbound frames leave through an unbounded byte
//! channel drained by the transport writer, so handlers never block on
//! socket I/O.

use crate::application::{Application, SessionId};
use crate::session::Session;
use cobaltfix_core::error::SessionError;
use cobaltfix_core::message::OwnedMessage;
use cobaltfix_store::MessageStore;
use cobaltfix_tagvalue::MessageBuilder;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::debug;

/// Queue depth for the per-session event channel.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Events multiplexed by the session loop.
#[derive(Debug)]
pub enum SessionEvent {
    /// An inbound message parsed by the transport layer.
    Message(OwnedMessage),
    /// An application-originated send request.
    Send(MessageBuilder),
    /// Start the initiator logon handshake.
    Logon,
    /// Start a logout handshake with the given reason.
    Logout(String),
    /// The transport dropped; tear the session down.
    Disconnect,
}

/// Cloneable handle posting events into a session loop.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    events: mpsc::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Returns the identity of the session behind this handle.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Queues an application message for sending.
    ///
    /// # Errors
    /// Returns `SessionError::Terminated` if the session loop has exited.
    pub async fn send(&self, builder: MessageBuilder) -> Result<(), SessionError> {
        self.post(SessionEvent::Send(builder)).await
    }

    /// Delivers an inbound message from the transport reader.
    ///
    /// # Errors
    /// Returns `SessionError::Terminated` if the session loop has exited.
    pub async fn deliver(&self, msg: OwnedMessage) -> Result<(), SessionError> {
        self.post(SessionEvent::Message(msg)).await
    }

    /// Requests the initiator logon handshake.
    ///
    /// # Errors
    /// Returns `SessionError::Terminated` if the session loop has exited.
    pub async fn initiate_logon(&self) -> Result<(), SessionError> {
        self.post(SessionEvent::Logon).await
    }

    /// Requests a logout handshake.
    ///
    /// # Errors
    /// Returns `SessionError::Terminated` if the session loop has exited.
    pub async fn initiate_logout(&self, reason: impl Into<String>) -> Result<(), SessionError> {
        self.post(SessionEvent::Logout(reason.into())).await
    }

    /// Signals that the transport has dropped.
    ///
    /// # Errors
    /// Returns `SessionError::Terminated` if the session loop has exited.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        self.post(SessionEvent::Disconnect).await
    }

    async fn post(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.events
            .send(event)
            .await
            .map_err(|_| SessionError::Terminated)
    }
}

/// Spawns the event loop for a session and returns its handle.
pub fn spawn<A, S>(session: Session<A, S>) -> (SessionHandle, JoinHandle<()>)
where
    A: Application + 'static,
    S: MessageStore + 'static,
{
    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let handle = SessionHandle {
        session_id: session.session_id().clone(),
        events: events_tx,
    };
    let join = tokio::spawn(run(session, events_rx));
    (handle, join)
}

/// The session loop: waits for the next event or the earliest timer
/// deadline, whichever comes first, until the session tears down.
pub async fn run<A, S>(mut session: Session<A, S>, mut events: mpsc::Receiver<SessionEvent>)
where
    A: Application,
    S: MessageStore,
{
    loop {
        let alive = match session.next_deadline() {
            Some((deadline, timer_event)) => {
                tokio::select! {
                    event = events.recv() => match event {
                        Some(event) => session.on_event(event).await,
                        None => {
                            session.disconnect().await;
                            false
                        }
                    },
                    () = time::sleep_until(deadline) => session.on_timer(timer_event).await,
                }
            }
            None => match events.recv().await {
                Some(event) => session.on_event(event).await,
                None => {
                    session.disconnect().await;
                    false
                }
            },
        };

        if !alive {
            break;
        }
    }
    debug!(session = %session.session_id(), "session loop finished");
}
