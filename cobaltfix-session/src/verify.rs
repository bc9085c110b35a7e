/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Inbound message verification.
//!
//! Every inbound administrative or application message passes these header
//! checks before any state logic runs, in a fixed order: BeginString,
//! CompIDs, SendingTime accuracy, MsgSeqNum. The sequence checks can be
//! relaxed selectively: a ResendRequest must not itself trigger gap recovery,
//! and a hard SequenceReset may arrive with any sequence number.
//!
//! Verification reads the expected sequence number and session identity but
//! mutates nothing; a failed check hands the message, intact, to the reject
//! path.

use crate::application::Application;
use crate::session::Session;
use cobaltfix_core::error::SessionError;
use cobaltfix_core::message::OwnedMessage;
use cobaltfix_core::tags;
use cobaltfix_core::types::Timestamp;
use cobaltfix_store::MessageStore;

impl<A: Application, S: MessageStore> Session<A, S> {
    /// Runs all header checks, including both sequence number directions.
    pub(crate) fn verify(&self, msg: &OwnedMessage) -> Result<(), SessionError> {
        self.verify_select(msg, true, true)
    }

    /// Runs the header checks with the sequence checks disabled. Used for
    /// ResendRequest handling, where a gap must not trigger another gap.
    pub(crate) fn verify_ignore_seq(&self, msg: &OwnedMessage) -> Result<(), SessionError> {
        self.verify_select(msg, false, false)
    }

    /// Runs the header checks with selective sequence enforcement.
    pub(crate) fn verify_select(
        &self,
        msg: &OwnedMessage,
        check_too_high: bool,
        check_too_low: bool,
    ) -> Result<(), SessionError> {
        let begin_string = msg.begin_string().unwrap_or_default();
        if begin_string != self.config.begin_string.as_str() {
            return Err(SessionError::IncorrectBeginString {
                received: begin_string.to_string(),
            });
        }

        // Inbound identity is the mirror image of ours.
        let sender_ok = msg.sender_comp_id() == Some(self.session_id.target_comp_id.as_str());
        let target_ok = msg.target_comp_id() == Some(self.session_id.sender_comp_id.as_str());
        if !sender_ok || !target_ok {
            return Err(SessionError::CompIdProblem);
        }

        let Some(sending_time) = msg.sending_time() else {
            return Err(SessionError::RequiredTagMissing {
                tag: tags::SENDING_TIME,
            });
        };
        if sending_time.abs_delta(Timestamp::now()) > self.config.sending_time_tolerance {
            return Err(SessionError::SendingTimeAccuracyProblem);
        }

        let Some(seq_num) = msg.msg_seq_num() else {
            return Err(SessionError::RequiredTagMissing {
                tag: tags::MSG_SEQ_NUM,
            });
        };
        if check_too_high && seq_num > self.expected_seq_num {
            return Err(SessionError::TargetTooHigh {
                received: seq_num,
                expected: self.expected_seq_num,
            });
        }
        if check_too_low && seq_num < self.expected_seq_num {
            return Err(SessionError::TargetTooLow {
                received: seq_num,
                expected: self.expected_seq_num,
            });
        }

        Ok(())
    }
}
