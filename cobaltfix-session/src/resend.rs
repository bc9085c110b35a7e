/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Replay of stored messages in answer to a ResendRequest.
//!
//! Application messages are retransmitted with PossDupFlag set and the
//! original SendingTime preserved in OrigSendingTime. Administrative
//! messages are never retransmitted: their sequence slots are bridged with
//! SequenceReset-GapFill messages advancing the peer's expected sequence
//! number past them. Replayed frames bypass the store and the outbound
//! sequence counter: the sequence numbers on the wire are the originals.

use crate::application::Application;
use crate::session::Session;
use cobaltfix_core::error::StoreError;
use cobaltfix_core::message::{MsgType, RawMessage};
use cobaltfix_core::tags;
use cobaltfix_core::types::{SeqNum, Timestamp};
use cobaltfix_store::MessageStore;
use cobaltfix_tagvalue::{Decoder, MessageBuilder};
use tracing::{error, info};

/// Header tags owned by the replay rebuild; everything else in a stored
/// frame is copied through verbatim.
const REBUILT_TAGS: [u32; 10] = [
    tags::BEGIN_STRING,
    tags::BODY_LENGTH,
    tags::CHECK_SUM,
    tags::MSG_TYPE,
    tags::MSG_SEQ_NUM,
    tags::SENDER_COMP_ID,
    tags::TARGET_COMP_ID,
    tags::SENDING_TIME,
    tags::POSS_DUP_FLAG,
    tags::ORIG_SENDING_TIME,
];

impl<A: Application, S: MessageStore> Session<A, S> {
    /// Replays the stored range `[begin, end]`.
    ///
    /// Two cursors walk the range: `seq_num` is the next slot the peer still
    /// needs an answer for, `next_seq_num` tracks how far administrative
    /// messages have pushed the pending gap fill. Each application message
    /// first bridges any accumulated gap, then goes out as a possible
    /// duplicate; a trailing gap fill covers administrative messages at the
    /// end of the range.
    ///
    /// # Errors
    /// Returns `StoreError` if the range cannot be read or a stored frame no
    /// longer parses.
    pub(crate) async fn replay(&mut self, begin: SeqNum, end: SeqNum) -> Result<(), StoreError> {
        let stored = self.store.get_messages(begin, end).await?;

        let mut seq_num = begin;
        let mut next_seq_num = seq_num;

        for (stored_seq, bytes) in stored {
            let raw = Decoder::new(&bytes)
                .decode()
                .map_err(|e| StoreError::Corrupted {
                    reason: format!("stored message {stored_seq} no longer parses: {e}"),
                })?;

            if raw.msg_type().is_admin() {
                next_seq_num = stored_seq.next();
            } else {
                if seq_num < stored_seq {
                    self.generate_sequence_reset(seq_num, stored_seq).await;
                }
                self.resend_stored(&raw).await;
                seq_num = stored_seq.next();
                next_seq_num = seq_num;
            }
        }

        if seq_num < next_seq_num {
            self.generate_sequence_reset(seq_num, next_seq_num).await;
        }
        Ok(())
    }

    /// Retransmits one stored frame as a possible duplicate: same MsgSeqNum,
    /// PossDupFlag=Y, the original SendingTime moved to OrigSendingTime, and
    /// a fresh SendingTime stamped.
    async fn resend_stored(&mut self, raw: &RawMessage<'_>) {
        let mut builder = MessageBuilder::new(raw.msg_type().clone());

        if let Some(seq) = raw.get_field_str(tags::MSG_SEQ_NUM) {
            builder.set_header(tags::MSG_SEQ_NUM, seq);
        }
        builder.set_header_bool(tags::POSS_DUP_FLAG, true);
        builder.set_header(tags::SENDER_COMP_ID, self.session_id.sender_comp_id.as_str());
        builder.set_header(tags::TARGET_COMP_ID, self.session_id.target_comp_id.as_str());
        builder.set_header_timestamp(tags::SENDING_TIME, Timestamp::now());
        if let Some(orig) = raw.get_field_str(tags::SENDING_TIME) {
            builder.set_header(tags::ORIG_SENDING_TIME, orig);
        }

        for field in raw.fields() {
            if REBUILT_TAGS.contains(&field.tag) {
                continue;
            }
            builder.push_body(field.tag, field.as_str().unwrap_or_default());
        }

        info!(
            session = %self.session_id,
            seq = raw.get_field_str(tags::MSG_SEQ_NUM).unwrap_or("?"),
            msg_type = %raw.msg_type(),
            "resending stored message"
        );
        match builder.encode(self.config.begin_string.as_str()) {
            Ok(bytes) => self.enqueue(bytes),
            Err(e) => {
                error!(session = %self.session_id, error = %e, "failed to rebuild stored message")
            }
        }
    }

    /// Emits a SequenceReset-GapFill advancing the peer from `begin_seq_no`
    /// to `new_seq_no`. The frame reuses the bridged slot's sequence number
    /// and is marked as a possible duplicate.
    pub(crate) async fn generate_sequence_reset(&mut self, begin_seq_no: SeqNum, new_seq_no: SeqNum) {
        let now = Timestamp::now();
        let mut builder = MessageBuilder::new(MsgType::SequenceReset);
        builder.set_header_uint(tags::MSG_SEQ_NUM, begin_seq_no.value());
        builder.set_header_bool(tags::POSS_DUP_FLAG, true);
        builder.set_header(tags::SENDER_COMP_ID, self.session_id.sender_comp_id.as_str());
        builder.set_header(tags::TARGET_COMP_ID, self.session_id.target_comp_id.as_str());
        builder.set_header_timestamp(tags::SENDING_TIME, now);
        builder.set_header_timestamp(tags::ORIG_SENDING_TIME, now);
        builder.set_body_uint(tags::NEW_SEQ_NO, new_seq_no.value());
        builder.set_body_bool(tags::GAP_FILL_FLAG, true);

        info!(
            session = %self.session_id,
            from = %begin_seq_no,
            to = %new_seq_no,
            "sending gap fill"
        );
        match builder.encode(self.config.begin_string.as_str()) {
            Ok(bytes) => self.enqueue(bytes),
            Err(e) => error!(session = %self.session_id, error = %e, "failed to build gap fill"),
        }
    }
}
