/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message store trait definition.
//!
//! The store owns two counters (next sender and next target sequence number)
//! and an ordered log of outbound message bytes keyed by MsgSeqNum. Sequence
//! numbers survive reconnects through the store unless a reset is negotiated
//! at logon.

use async_trait::async_trait;
use bytes::Bytes;
use cobaltfix_core::error::StoreError;
use cobaltfix_core::types::SeqNum;

/// Abstract interface for FIX message storage.
///
/// Implementations persist outgoing messages so resend requests can be
/// answered after a gap, and keep the per-direction sequence counters.
/// Counter reads and writes are synchronous; log operations may touch
/// durable media and are async.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Returns the next outbound sequence number to assign.
    fn next_sender_seq(&self) -> SeqNum;

    /// Returns the next inbound sequence number expected.
    fn next_target_seq(&self) -> SeqNum;

    /// Advances the outbound counter by one.
    fn incr_next_sender_seq(&self);

    /// Advances the inbound counter by one.
    fn incr_next_target_seq(&self);

    /// Sets the outbound counter.
    fn set_next_sender_seq(&self, seq: SeqNum);

    /// Sets the inbound counter.
    fn set_next_target_seq(&self, seq: SeqNum);

    /// Stores an outgoing message under its sequence number.
    ///
    /// The append is atomic and monotonic: `seq_num` must be exactly the
    /// current next sender sequence number, keeping the log dense.
    ///
    /// # Errors
    /// Returns `StoreError::OutOfSequence` if `seq_num` is not the current
    /// next value, or an I/O variant if persistence fails.
    async fn save_message(&self, seq_num: SeqNum, message: &[u8]) -> Result<(), StoreError>;

    /// Retrieves stored messages for a resend request.
    ///
    /// Returns `(seq_num, bytes)` pairs in sequence order for the inclusive
    /// range `[begin, end]`. The caller normalizes sentinel end values before
    /// asking.
    ///
    /// # Errors
    /// Returns `StoreError` if the log cannot be read.
    async fn get_messages(
        &self,
        begin: SeqNum,
        end: SeqNum,
    ) -> Result<Vec<(SeqNum, Bytes)>, StoreError>;

    /// Drops all messages and resets both counters to 1.
    ///
    /// # Errors
    /// Returns `StoreError` if the reset fails.
    async fn reset(&self) -> Result<(), StoreError>;

    /// Returns the creation time of the store record.
    fn creation_time(&self) -> std::time::SystemTime;

    /// Re-reads counters and index from durable media, if any.
    ///
    /// # Errors
    /// Returns `StoreError` if the refresh fails.
    async fn refresh(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullStore;

    #[async_trait]
    impl MessageStore for NullStore {
        fn next_sender_seq(&self) -> SeqNum {
            SeqNum::new(1)
        }

        fn next_target_seq(&self) -> SeqNum {
            SeqNum::new(1)
        }

        fn incr_next_sender_seq(&self) {}

        fn incr_next_target_seq(&self) {}

        fn set_next_sender_seq(&self, _seq: SeqNum) {}

        fn set_next_target_seq(&self, _seq: SeqNum) {}

        async fn save_message(&self, _seq_num: SeqNum, _message: &[u8]) -> Result<(), StoreError> {
            Ok(())
        }

        async fn get_messages(
            &self,
            _begin: SeqNum,
            _end: SeqNum,
        ) -> Result<Vec<(SeqNum, Bytes)>, StoreError> {
            Ok(vec![])
        }

        async fn reset(&self) -> Result<(), StoreError> {
            Ok(())
        }

        fn creation_time(&self) -> std::time::SystemTime {
            std::time::SystemTime::now()
        }
    }

    #[tokio::test]
    async fn test_trait_object_safety() {
        let store: Box<dyn MessageStore> = Box::new(NullStore);
        assert_eq!(store.next_sender_seq(), SeqNum::new(1));
        assert!(store.save_message(SeqNum::new(1), b"test").await.is_ok());
        assert!(store.refresh().await.is_ok());
    }
}
