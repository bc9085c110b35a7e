/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! The session object and its per-state behavior.
//!
//! A [`Session`] is owned exclusively by its event loop. Every mutation
//! happens on that loop: inbound messages, timer expiry, and application send
//! requests all arrive as events, are interpreted by the current state, and
//! produce the next state.
//!
//! The send path stamps the default header, freezes the builder to bytes,
//! appends to the message store, and only then hands the frame to the
//! transport. Persistence happens-before the bytes leave the process, so a
//! later ResendRequest can always be answered from the store.

use crate::application::{Application, RejectReason, SessionId};
use crate::config::SessionConfig;
use crate::dispatcher::SessionEvent;
use crate::state::{State, Transition};
use crate::timers::{SessionTimers, TimerEvent};
use bytes::Bytes;
use cobaltfix_core::error::{FixError, SessionError};
use cobaltfix_core::message::{MsgType, OwnedMessage};
use cobaltfix_core::tags;
use cobaltfix_core::types::{BeginString, SeqNum, Timestamp};
use cobaltfix_store::MessageStore;
use cobaltfix_tagvalue::MessageBuilder;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// TestReqID value used for engine-generated test requests.
const TEST_REQ_ID_VALUE: &str = "TEST";

/// EndSeqNo sentinel meaning "through infinity" on pre-FIX.4.2 sessions.
const LEGACY_END_SEQ_NO_INFINITY: u64 = 999_999;

/// The per-session state: sequence counters, state machine, stash, timers,
/// and shared references to the store and application.
pub struct Session<A: Application, S: MessageStore> {
    pub(crate) session_id: SessionId,
    pub(crate) config: SessionConfig,
    pub(crate) state: State,
    /// Next inbound sequence number expected.
    pub(crate) expected_seq_num: SeqNum,
    /// True between a completed logon handshake and the logout notification.
    pub(crate) logged_on: bool,
    /// Set when the store faults; the loop tears the session down after the
    /// current event.
    pub(crate) store_failed: bool,
    /// Out-of-order inbound messages buffered during gap recovery,
    /// keyed by sequence number.
    pub(crate) stash: BTreeMap<SeqNum, OwnedMessage>,
    pub(crate) store: Arc<S>,
    pub(crate) application: Arc<A>,
    pub(crate) outbound: mpsc::UnboundedSender<Bytes>,
    pub(crate) timers: SessionTimers,
}

impl<A: Application, S: MessageStore> Session<A, S> {
    /// Creates a session in the latent state.
    ///
    /// Sequence numbers are picked up from the store, so a reconnecting
    /// session resumes where the previous connection left off.
    pub async fn new(
        config: SessionConfig,
        store: Arc<S>,
        application: Arc<A>,
        outbound: mpsc::UnboundedSender<Bytes>,
    ) -> Self {
        let session_id = config.session_id();
        let expected_seq_num = store.next_target_seq();
        let timers = SessionTimers::new(config.heartbeat_interval);

        let session = Self {
            session_id,
            config,
            state: State::Latent,
            expected_seq_num,
            logged_on: false,
            store_failed: false,
            stash: BTreeMap::new(),
            store,
            application,
            outbound,
            timers,
        };
        session.application.on_create(&session.session_id).await;
        session
    }

    /// Returns the session identity.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the next inbound sequence number expected.
    #[must_use]
    pub fn expected_seq_num(&self) -> SeqNum {
        self.expected_seq_num
    }

    /// Returns the number of stashed out-of-order messages.
    #[must_use]
    pub fn stash_len(&self) -> usize {
        self.stash.len()
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the earliest pending timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<(Instant, TimerEvent)> {
        self.timers.next_deadline()
    }

    /// Handles one event from the session loop. Returns false when the
    /// connection must be dropped and the loop should exit.
    pub async fn on_event(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Message(msg) => self.on_message(msg).await,
            SessionEvent::Send(builder) => {
                if let Err(e) = self.send(builder).await {
                    error!(session = %self.session_id, error = %e, "failed to send message");
                }
                self.finish(Transition::Next(self.state)).await
            }
            SessionEvent::Logon => {
                let transition = self.begin_logon().await;
                self.finish(transition).await
            }
            SessionEvent::Logout(reason) => {
                let transition = if self.state.is_active() {
                    self.initiate_logout(&reason).await
                } else {
                    Transition::Next(self.state)
                };
                self.finish(transition).await
            }
            SessionEvent::Disconnect => {
                self.disconnect().await;
                false
            }
        }
    }

    /// Handles one inbound message. Returns false when the connection must
    /// be dropped.
    pub async fn on_message(&mut self, msg: OwnedMessage) -> bool {
        self.timers.on_message_received();
        let transition = match self.state {
            State::Latent => self.latent_on_message(msg).await,
            State::LogonPending => self.logon_pending_on_message(msg).await,
            State::InSession => self.in_session_on_message(msg).await,
            State::Resend => self.resend_on_message(msg).await,
            State::PendingTimeout => {
                // Any inbound traffic proves the peer is alive again.
                let transition = if self.stash.is_empty() {
                    self.in_session_on_message(msg).await
                } else {
                    self.resend_on_message(msg).await
                };
                match transition {
                    Transition::Next(State::PendingTimeout) => Transition::Next(State::InSession),
                    other => other,
                }
            }
            State::Logout => self.logout_on_message(msg).await,
        };
        self.finish(transition).await
    }

    /// Handles a fired timer deadline. Returns false when the connection
    /// must be dropped.
    pub async fn on_timer(&mut self, event: TimerEvent) -> bool {
        self.timers.fire(event);
        let transition = match (self.state, event) {
            (
                State::InSession | State::Resend | State::PendingTimeout,
                TimerEvent::NeedHeartbeat,
            ) => {
                self.send_admin(MessageBuilder::new(MsgType::Heartbeat)).await;
                Transition::Next(self.state)
            }
            (State::InSession | State::Resend, TimerEvent::PeerTimeout) => {
                info!(session = %self.session_id, "peer silent, sending test request");
                let mut test_request = MessageBuilder::new(MsgType::TestRequest);
                test_request.set_body(tags::TEST_REQ_ID, TEST_REQ_ID_VALUE);
                self.send_admin(test_request).await;
                self.timers.extend_peer_window();
                Transition::Next(State::PendingTimeout)
            }
            (State::PendingTimeout, TimerEvent::PeerTimeout) => {
                warn!(session = %self.session_id, "peer unresponsive, dropping connection");
                Transition::Disconnect
            }
            (State::LogonPending, TimerEvent::StateTimeout) => {
                warn!(session = %self.session_id, "logon timed out");
                Transition::Disconnect
            }
            (State::Logout, TimerEvent::StateTimeout) => {
                info!(session = %self.session_id, "logout grace period expired");
                Transition::Disconnect
            }
            _ => Transition::Next(self.state),
        };
        self.finish(transition).await
    }

    /// Stamps, persists, and enqueues an outbound message.
    ///
    /// # Errors
    /// Returns `FixError` if encoding or persistence fails. A store fault
    /// also marks the session for teardown.
    pub async fn send(&mut self, mut builder: MessageBuilder) -> Result<(), FixError> {
        if builder.msg_type().is_admin() {
            self.application
                .to_admin(&mut builder, &self.session_id)
                .await;
        } else if self
            .application
            .to_app(&mut builder, &self.session_id)
            .await
            .is_err()
        {
            debug!(session = %self.session_id, "outbound message withheld by application");
            return Ok(());
        }

        let seq = self.store.next_sender_seq();
        self.stamp_header(&mut builder, seq);
        let bytes = builder.encode(self.config.begin_string.as_str())?;

        if let Err(e) = self.store.save_message(seq, &bytes).await {
            self.store_failed = true;
            return Err(FixError::Store(e));
        }
        self.store.incr_next_sender_seq();
        self.enqueue(bytes);
        Ok(())
    }

    /// Tears the session down: notifies the application, optionally resets
    /// the store, and returns the state machine to latent.
    pub(crate) async fn disconnect(&mut self) {
        self.notify_logout().await;
        if self.state != State::Latent {
            info!(session = %self.session_id, "session disconnected");
        }
        if self.config.reset_on_disconnect {
            if let Err(e) = self.store.reset().await {
                error!(session = %self.session_id, error = %e, "failed to reset store on disconnect");
            }
            self.expected_seq_num = SeqNum::new(1);
        }
        self.state = State::Latent;
        self.stash.clear();
        self.timers.disable();
    }

    // ------------------------------------------------------------------
    // State handlers
    // ------------------------------------------------------------------

    async fn latent_on_message(&mut self, msg: OwnedMessage) -> Transition {
        if *msg.msg_type() != MsgType::Logon {
            warn!(
                session = %self.session_id,
                msg_type = %msg.msg_type(),
                "message received while no session is established"
            );
            return Transition::Next(State::Latent);
        }
        self.accept_logon(msg).await
    }

    /// Acceptor side of the logon handshake.
    async fn accept_logon(&mut self, msg: OwnedMessage) -> Transition {
        let reset_requested = msg
            .get_field_bool(tags::RESET_SEQ_NUM_FLAG)
            .unwrap_or(false);
        if reset_requested {
            info!(session = %self.session_id, "resetting sequence numbers at peer request");
            if let Err(e) = self.store.reset().await {
                error!(session = %self.session_id, error = %e, "store reset failed");
                self.store_failed = true;
                return Transition::Disconnect;
            }
            self.expected_seq_num = SeqNum::new(1);
        }

        match self.verify(&msg) {
            Ok(()) => {}
            Err(err @ SessionError::TargetTooHigh { .. }) => {
                // Reply first so the counterparty knows the session is up,
                // then recover the gap.
                self.adopt_heartbeat_interval(&msg);
                let reply = self.logon_builder(reset_requested);
                self.send_admin(reply).await;
                self.establish().await;
                return self.process_reject(msg, err).await;
            }
            Err(err) => {
                warn!(session = %self.session_id, error = %err, "logon rejected");
                return self.initiate_logout(&err.to_string()).await;
            }
        }

        self.adopt_heartbeat_interval(&msg);
        let reply = self.logon_builder(reset_requested);
        self.send_admin(reply).await;
        self.establish().await;
        self.incr_expected();
        info!(session = %self.session_id, "session established");
        Transition::Next(State::InSession)
    }

    /// Initiator side of the logon handshake, after our Logon went out.
    async fn logon_pending_on_message(&mut self, msg: OwnedMessage) -> Transition {
        if *msg.msg_type() != MsgType::Logon {
            warn!(
                session = %self.session_id,
                msg_type = %msg.msg_type(),
                "expected logon, dropping connection"
            );
            return Transition::Disconnect;
        }

        self.timers.clear_state_timeout();
        match self.verify(&msg) {
            Ok(()) => {}
            Err(err @ SessionError::TargetTooHigh { .. }) => {
                self.adopt_heartbeat_interval(&msg);
                self.establish().await;
                return self.process_reject(msg, err).await;
            }
            Err(err) => {
                warn!(session = %self.session_id, error = %err, "counterparty logon failed verification");
                return self.initiate_logout(&err.to_string()).await;
            }
        }

        self.adopt_heartbeat_interval(&msg);
        self.establish().await;
        self.incr_expected();
        info!(session = %self.session_id, "session established");
        Transition::Next(State::InSession)
    }

    async fn in_session_on_message(&mut self, msg: OwnedMessage) -> Transition {
        match msg.msg_type().clone() {
            MsgType::Logon => self.in_session_logon(msg).await,
            MsgType::Logout => self.in_session_logout(msg).await,
            MsgType::TestRequest => self.in_session_test_request(msg).await,
            MsgType::ResendRequest => self.in_session_resend_request(msg).await,
            MsgType::SequenceReset => self.in_session_sequence_reset(msg).await,
            _ => self.in_session_default(msg).await,
        }
    }

    /// A message arrived while a ResendRequest is outstanding. Process it
    /// with the normal in-session logic, then drain any stashed messages the
    /// advancing sequence has made deliverable.
    async fn resend_on_message(&mut self, msg: OwnedMessage) -> Transition {
        let transition = self.in_session_on_message(msg).await;
        if !matches!(
            transition,
            Transition::Next(State::InSession | State::Resend)
        ) {
            return transition;
        }

        while let Some(stashed) = self.stash.remove(&self.expected_seq_num) {
            debug!(
                session = %self.session_id,
                seq = %self.expected_seq_num,
                "delivering stashed message"
            );
            let transition = self.in_session_on_message(stashed).await;
            if !matches!(
                transition,
                Transition::Next(State::InSession | State::Resend)
            ) {
                return transition;
            }
        }

        if self.stash.is_empty() {
            Transition::Next(State::InSession)
        } else {
            Transition::Next(State::Resend)
        }
    }

    async fn logout_on_message(&mut self, msg: OwnedMessage) -> Transition {
        if *msg.msg_type() == MsgType::Logout {
            info!(session = %self.session_id, "logout acknowledged by peer");
            self.notify_logout().await;
            return Transition::Disconnect;
        }
        // Keep consuming traffic during the grace period.
        match self.in_session_on_message(msg).await {
            Transition::Next(_) => Transition::Next(State::Logout),
            Transition::Disconnect => Transition::Disconnect,
        }
    }

    // ------------------------------------------------------------------
    // In-session administrative handling
    // ------------------------------------------------------------------

    async fn in_session_logon(&mut self, msg: OwnedMessage) -> Transition {
        if let Err(err) = self.verify(&msg) {
            warn!(session = %self.session_id, error = %err, "in-session logon failed verification");
            return self.initiate_logout("").await;
        }
        self.adopt_heartbeat_interval(&msg);
        self.incr_expected();
        Transition::Next(State::InSession)
    }

    async fn in_session_logout(&mut self, _msg: OwnedMessage) -> Transition {
        info!(session = %self.session_id, "received logout request");
        self.generate_logout("").await;
        self.notify_logout().await;
        Transition::Next(State::Latent)
    }

    async fn in_session_test_request(&mut self, msg: OwnedMessage) -> Transition {
        if let Err(err) = self.verify(&msg) {
            return self.process_reject(msg, err).await;
        }
        match msg.get_field_str(tags::TEST_REQ_ID) {
            Some(id) => {
                let mut heartbeat = MessageBuilder::new(MsgType::Heartbeat);
                heartbeat.set_body(tags::TEST_REQ_ID, id);
                self.send_admin(heartbeat).await;
            }
            None => info!(session = %self.session_id, "test request without TestReqID"),
        }
        self.incr_expected();
        Transition::Next(State::InSession)
    }

    async fn in_session_resend_request(&mut self, msg: OwnedMessage) -> Transition {
        if let Err(err) = self.verify_ignore_seq(&msg) {
            return self.process_reject(msg, err).await;
        }

        let Some(begin) = msg.get_field_u64(tags::BEGIN_SEQ_NO) else {
            let err = SessionError::RequiredTagMissing {
                tag: tags::BEGIN_SEQ_NO,
            };
            return self.process_reject(msg, err).await;
        };
        let Some(end) = msg.get_field_u64(tags::END_SEQ_NO) else {
            let err = SessionError::RequiredTagMissing {
                tag: tags::END_SEQ_NO,
            };
            return self.process_reject(msg, err).await;
        };

        info!(session = %self.session_id, begin, end, "received resend request");
        let end = self.normalize_end_seq_no(end);

        if let Err(e) = self.replay(SeqNum::new(begin), end).await {
            error!(session = %self.session_id, error = %e, "replay failed");
            self.store_failed = true;
            return Transition::Next(State::InSession);
        }

        self.incr_expected();
        Transition::Next(State::InSession)
    }

    /// Resolves the dialect-dependent EndSeqNo sentinel against the store's
    /// next outbound sequence number.
    fn normalize_end_seq_no(&self, end: u64) -> SeqNum {
        let next = self.store.next_sender_seq();
        let infinity = (self.config.begin_string >= BeginString::Fix42 && end == 0)
            || (self.config.begin_string < BeginString::Fix42
                && end == LEGACY_END_SEQ_NO_INFINITY);
        if infinity || end >= next.value() {
            SeqNum::new(next.value().saturating_sub(1))
        } else {
            SeqNum::new(end)
        }
    }

    async fn in_session_sequence_reset(&mut self, msg: OwnedMessage) -> Transition {
        let gap_fill = msg.get_field_bool(tags::GAP_FILL_FLAG).unwrap_or(false);
        // Sequence checks apply to the gap-fill form only; a hard reset is
        // allowed to arrive with any sequence number.
        if let Err(err) = self.verify_select(&msg, gap_fill, gap_fill) {
            return self.process_reject(msg, err).await;
        }

        let Some(new_seq) = msg.get_field_u64(tags::NEW_SEQ_NO) else {
            let err = SessionError::RequiredTagMissing {
                tag: tags::NEW_SEQ_NO,
            };
            return self.process_reject(msg, err).await;
        };
        let new_seq = SeqNum::new(new_seq);

        info!(
            session = %self.session_id,
            from = %self.expected_seq_num,
            to = %new_seq,
            "received sequence reset"
        );

        if new_seq > self.expected_seq_num {
            self.set_expected(new_seq);
        } else if new_seq < self.expected_seq_num {
            // No RefTagID on this reject, for wire compatibility with
            // engines that do not tolerate one here.
            self.do_reject(&msg, &SessionError::ValueIsIncorrect { tag: None })
                .await;
        }
        Transition::Next(State::InSession)
    }

    async fn in_session_default(&mut self, msg: OwnedMessage) -> Transition {
        if let Err(err) = self.verify(&msg) {
            return self.process_reject(msg, err).await;
        }
        if let Err(reason) = self.from_callback(&msg).await {
            self.reject_application(&msg, &reason).await;
            self.incr_expected();
            return Transition::Next(State::InSession);
        }
        self.incr_expected();
        Transition::Next(State::InSession)
    }

    // ------------------------------------------------------------------
    // Reject path
    // ------------------------------------------------------------------

    /// Routes a verification failure to its session-level response.
    pub(crate) async fn process_reject(
        &mut self,
        msg: OwnedMessage,
        err: SessionError,
    ) -> Transition {
        match err {
            SessionError::TargetTooHigh { received, expected } => {
                if self.state != State::Resend {
                    warn!(
                        session = %self.session_id,
                        received = %received,
                        expected = %expected,
                        "sequence gap detected"
                    );
                    self.send_resend_request(expected).await;
                }
                self.stash.insert(received, msg);
                Transition::Next(State::Resend)
            }
            SessionError::TargetTooLow { .. } => self.handle_target_too_low(msg, &err).await,
            SessionError::IncorrectBeginString { .. } => {
                warn!(session = %self.session_id, error = %err, "begin string mismatch");
                self.initiate_logout(&err.to_string()).await
            }
            SessionError::CompIdProblem | SessionError::SendingTimeAccuracyProblem => {
                self.do_reject(&msg, &err).await;
                self.initiate_logout("").await
            }
            _ => {
                self.do_reject(&msg, &err).await;
                self.incr_expected();
                Transition::Next(self.state)
            }
        }
    }

    /// A message arrived below the expected sequence number. Legitimate only
    /// as a possible duplicate with a sane OrigSendingTime; anything else
    /// ends the session.
    async fn handle_target_too_low(&mut self, msg: OwnedMessage, err: &SessionError) -> Transition {
        if !msg.poss_dup_flag() {
            warn!(session = %self.session_id, error = %err, "sequence number below expected");
            return self.initiate_logout(&err.to_string()).await;
        }

        let Some(orig_sending_time) = msg.orig_sending_time() else {
            let missing = SessionError::RequiredTagMissing {
                tag: tags::ORIG_SENDING_TIME,
            };
            self.do_reject(&msg, &missing).await;
            return Transition::Next(self.state);
        };

        let sending_time = msg.sending_time();
        if sending_time.is_none_or(|t| t < orig_sending_time) {
            self.do_reject(&msg, &SessionError::SendingTimeAccuracyProblem)
                .await;
            return self.initiate_logout("").await;
        }

        // Deliver the duplicate without touching the expected sequence
        // number.
        if let Err(reason) = self.from_callback(&msg).await {
            self.reject_application(&msg, &reason).await;
            return self.initiate_logout("").await;
        }
        Transition::Next(self.state)
    }

    /// Sends a session-level Reject (MsgType 3) for the given error.
    async fn do_reject(&mut self, msg: &OwnedMessage, err: &SessionError) {
        warn!(session = %self.session_id, error = %err, "rejecting message");
        let mut reject = MessageBuilder::new(MsgType::Reject);
        if let Some(seq) = msg.msg_seq_num() {
            reject.set_body_uint(tags::REF_SEQ_NUM, seq.value());
        }
        if self.config.begin_string >= BeginString::Fix42 {
            if let Some(code) = err.reject_reason() {
                reject.set_body_uint(tags::SESSION_REJECT_REASON, u64::from(code));
            }
            if let Some(tag) = err.ref_tag_id() {
                reject.set_body_uint(tags::REF_TAG_ID, u64::from(tag));
            }
        }
        reject.set_body(tags::TEXT, err.to_string());
        self.send_admin(reject).await;
    }

    /// Sends a session-level Reject on behalf of the application.
    async fn reject_application(&mut self, msg: &OwnedMessage, reason: &RejectReason) {
        warn!(
            session = %self.session_id,
            code = reason.code,
            text = %reason.text,
            "application rejected message"
        );
        let mut reject = MessageBuilder::new(MsgType::Reject);
        if let Some(seq) = msg.msg_seq_num() {
            reject.set_body_uint(tags::REF_SEQ_NUM, seq.value());
        }
        if self.config.begin_string >= BeginString::Fix42 {
            reject.set_body_uint(tags::SESSION_REJECT_REASON, u64::from(reason.code));
            if let Some(tag) = reason.ref_tag {
                reject.set_body_uint(tags::REF_TAG_ID, u64::from(tag));
            }
        }
        if !reason.text.is_empty() {
            reject.set_body(tags::TEXT, reason.text.clone());
        }
        self.send_admin(reject).await;
    }

    // ------------------------------------------------------------------
    // Logon / logout plumbing
    // ------------------------------------------------------------------

    /// Starts the initiator logon handshake.
    async fn begin_logon(&mut self) -> Transition {
        if self.state != State::Latent {
            warn!(
                session = %self.session_id,
                state = %self.state,
                "logon requested while session is not latent"
            );
            return Transition::Next(self.state);
        }

        if self.config.reset_on_logon {
            if let Err(e) = self.store.reset().await {
                error!(session = %self.session_id, error = %e, "store reset failed");
                self.store_failed = true;
                return Transition::Disconnect;
            }
            self.expected_seq_num = SeqNum::new(1);
        }

        info!(session = %self.session_id, "initiating logon");
        let logon = self.logon_builder(self.config.reset_on_logon);
        self.send_admin(logon).await;
        self.timers.arm_state_timeout(self.config.logon_timeout);
        Transition::Next(State::LogonPending)
    }

    /// Sends a Logout and arms the grace timer. The peer gets
    /// `logout_timeout` to acknowledge before the connection drops.
    pub(crate) async fn initiate_logout(&mut self, reason: &str) -> Transition {
        self.generate_logout(reason).await;
        self.timers.arm_state_timeout(self.config.logout_timeout);
        Transition::Next(State::Logout)
    }

    async fn generate_logout(&mut self, reason: &str) {
        info!(session = %self.session_id, "sending logout");
        let mut logout = MessageBuilder::new(MsgType::Logout);
        if !reason.is_empty() {
            logout.set_body(tags::TEXT, reason);
        }
        self.send_admin(logout).await;
    }

    fn logon_builder(&self, reset: bool) -> MessageBuilder {
        let mut logon = MessageBuilder::new(MsgType::Logon);
        logon.set_body_uint(tags::ENCRYPT_METHOD, 0);
        logon.set_body_uint(
            tags::HEART_BT_INT,
            self.config.heartbeat_interval.as_secs(),
        );
        if reset {
            logon.set_body_bool(tags::RESET_SEQ_NUM_FLAG, true);
        }
        if self.config.begin_string.is_fixt()
            && let Some(ver) = &self.config.default_appl_ver_id
        {
            logon.set_body(tags::DEFAULT_APPL_VER_ID, ver.clone());
        }
        logon
    }

    /// Marks the session established and starts the liveness deadlines.
    async fn establish(&mut self) {
        self.logged_on = true;
        self.timers.clear_state_timeout();
        self.timers.enable();
        self.application.on_logon(&self.session_id).await;
    }

    async fn notify_logout(&mut self) {
        if self.logged_on {
            self.logged_on = false;
            self.application.on_logout(&self.session_id).await;
        }
    }

    fn adopt_heartbeat_interval(&mut self, msg: &OwnedMessage) {
        if let Some(secs) = msg.get_field_u64(tags::HEART_BT_INT)
            && secs > 0
        {
            let interval = Duration::from_secs(secs);
            if interval != self.config.heartbeat_interval {
                debug!(
                    session = %self.session_id,
                    seconds = secs,
                    "adopting peer heartbeat interval"
                );
                self.config.heartbeat_interval = interval;
            }
            self.timers.set_interval(interval);
        }
    }

    // ------------------------------------------------------------------
    // Shared plumbing
    // ------------------------------------------------------------------

    async fn send_resend_request(&mut self, begin: SeqNum) {
        let end = if self.config.begin_string >= BeginString::Fix42 {
            0
        } else {
            LEGACY_END_SEQ_NO_INFINITY
        };
        info!(session = %self.session_id, begin = %begin, "requesting resend");
        let mut resend = MessageBuilder::new(MsgType::ResendRequest);
        resend.set_body_uint(tags::BEGIN_SEQ_NO, begin.value());
        resend.set_body_uint(tags::END_SEQ_NO, end);
        self.send_admin(resend).await;
    }

    /// Sends an engine-generated administrative message, logging failures.
    /// A store fault is already recorded by [`Session::send`] and tears the
    /// session down after the current event.
    pub(crate) async fn send_admin(&mut self, builder: MessageBuilder) {
        if let Err(e) = self.send(builder).await {
            error!(session = %self.session_id, error = %e, "failed to send session message");
        }
    }

    /// Stamps the default header onto an outbound builder.
    fn stamp_header(&self, builder: &mut MessageBuilder, seq: SeqNum) {
        builder.set_header(tags::SENDER_COMP_ID, self.session_id.sender_comp_id.as_str());
        builder.set_header(tags::TARGET_COMP_ID, self.session_id.target_comp_id.as_str());
        builder.set_header_uint(tags::MSG_SEQ_NUM, seq.value());
        builder.set_header_timestamp(tags::SENDING_TIME, Timestamp::now());
    }

    /// Hands a finished frame to the transport writer and resets the
    /// heartbeat deadline.
    pub(crate) fn enqueue(&mut self, bytes: Bytes) {
        if self.outbound.send(bytes).is_err() {
            warn!(session = %self.session_id, "transport writer is gone, dropping outbound frame");
        }
        self.timers.on_message_sent();
    }

    async fn from_callback(&self, msg: &OwnedMessage) -> Result<(), RejectReason> {
        if msg.msg_type().is_admin() {
            self.application.from_admin(msg, &self.session_id).await
        } else {
            self.application.from_app(msg, &self.session_id).await
        }
    }

    fn incr_expected(&mut self) {
        self.expected_seq_num = self.expected_seq_num.next();
        self.store.incr_next_target_seq();
    }

    fn set_expected(&mut self, seq: SeqNum) {
        self.expected_seq_num = seq;
        self.store.set_next_target_seq(seq);
    }

    /// Applies a transition, handling the disconnect case and any pending
    /// store fault.
    async fn finish(&mut self, transition: Transition) -> bool {
        let transition = if self.store_failed {
            error!(session = %self.session_id, "message store failed, aborting session");
            Transition::Disconnect
        } else {
            transition
        };
        match transition {
            Transition::Next(next) => {
                if next == State::Latent {
                    self.timers.disable();
                }
                self.state = next;
                true
            }
            Transition::Disconnect => {
                self.disconnect().await;
                false
            }
        }
    }
}
