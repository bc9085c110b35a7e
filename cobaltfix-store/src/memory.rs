/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! In-memory message store implementation.
//!
//! A `BTreeMap` keyed by sequence number gives ordered range queries for
//! resend handling. Nothing is persisted; sessions backed by this store start
//! from sequence 1 after every process restart.

use crate::traits::MessageStore;
use async_trait::async_trait;
use bytes::Bytes;
use cobaltfix_core::error::StoreError;
use cobaltfix_core::types::SeqNum;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// In-memory message store.
#[derive(Debug)]
pub struct MemoryStore {
    /// Stored messages indexed by sequence number.
    messages: RwLock<BTreeMap<SeqNum, Bytes>>,
    /// Next sender sequence number.
    next_sender_seq: AtomicU64,
    /// Next expected target sequence number.
    next_target_seq: AtomicU64,
    /// Store creation time.
    creation_time: SystemTime,
}

impl MemoryStore {
    /// Creates a new empty memory store with both counters at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial_seqs(SeqNum::new(1), SeqNum::new(1))
    }

    /// Creates a new memory store with the given initial counters.
    #[must_use]
    pub fn with_initial_seqs(sender_seq: SeqNum, target_seq: SeqNum) -> Self {
        Self {
            messages: RwLock::new(BTreeMap::new()),
            next_sender_seq: AtomicU64::new(sender_seq.value()),
            next_target_seq: AtomicU64::new(target_seq.value()),
            creation_time: SystemTime::now(),
        }
    }

    /// Returns the number of stored messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.read().len()
    }

    /// Checks if a message with the given sequence number exists.
    #[must_use]
    pub fn contains(&self, seq_num: SeqNum) -> bool {
        self.messages.read().contains_key(&seq_num)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    fn next_sender_seq(&self) -> SeqNum {
        SeqNum::new(self.next_sender_seq.load(Ordering::SeqCst))
    }

    fn next_target_seq(&self) -> SeqNum {
        SeqNum::new(self.next_target_seq.load(Ordering::SeqCst))
    }

    fn incr_next_sender_seq(&self) {
        self.next_sender_seq.fetch_add(1, Ordering::SeqCst);
    }

    fn incr_next_target_seq(&self) {
        self.next_target_seq.fetch_add(1, Ordering::SeqCst);
    }

    fn set_next_sender_seq(&self, seq: SeqNum) {
        self.next_sender_seq.store(seq.value(), Ordering::SeqCst);
    }

    fn set_next_target_seq(&self, seq: SeqNum) {
        self.next_target_seq.store(seq.value(), Ordering::SeqCst);
    }

    async fn save_message(&self, seq_num: SeqNum, message: &[u8]) -> Result<(), StoreError> {
        let expected = self.next_sender_seq();
        if seq_num != expected {
            return Err(StoreError::OutOfSequence {
                expected,
                got: seq_num,
            });
        }
        self.messages
            .write()
            .insert(seq_num, Bytes::copy_from_slice(message));
        Ok(())
    }

    async fn get_messages(
        &self,
        begin: SeqNum,
        end: SeqNum,
    ) -> Result<Vec<(SeqNum, Bytes)>, StoreError> {
        if end < begin {
            return Ok(vec![]);
        }
        let messages = self.messages.read();
        Ok(messages
            .range(begin..=end)
            .map(|(seq, bytes)| (*seq, bytes.clone()))
            .collect())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.messages.write().clear();
        self.next_sender_seq.store(1, Ordering::SeqCst);
        self.next_target_seq.store(1, Ordering::SeqCst);
        Ok(())
    }

    fn creation_time(&self) -> SystemTime {
        self.creation_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_n(store: &MemoryStore, n: u64) {
        for seq in 1..=n {
            store
                .save_message(SeqNum::new(seq), format!("msg{seq}").as_bytes())
                .await
                .unwrap();
            store.incr_next_sender_seq();
        }
    }

    #[tokio::test]
    async fn test_memory_store_new() {
        let store = MemoryStore::new();
        assert_eq!(store.next_sender_seq(), SeqNum::new(1));
        assert_eq!(store.next_target_seq(), SeqNum::new(1));
        assert_eq!(store.message_count(), 0);
    }

    #[tokio::test]
    async fn test_memory_store_save_and_contains() {
        let store = MemoryStore::new();
        store_n(&store, 3).await;

        assert_eq!(store.message_count(), 3);
        assert!(store.contains(SeqNum::new(1)));
        assert!(store.contains(SeqNum::new(3)));
        assert!(!store.contains(SeqNum::new(4)));
        assert_eq!(store.next_sender_seq(), SeqNum::new(4));
    }

    #[tokio::test]
    async fn test_memory_store_rejects_out_of_sequence() {
        let store = MemoryStore::new();
        let err = store.save_message(SeqNum::new(5), b"skip").await.unwrap_err();
        assert_eq!(
            err,
            StoreError::OutOfSequence {
                expected: SeqNum::new(1),
                got: SeqNum::new(5)
            }
        );
    }

    #[tokio::test]
    async fn test_memory_store_get_messages_in_order() {
        let store = MemoryStore::new();
        store_n(&store, 5).await;

        let range = store
            .get_messages(SeqNum::new(2), SeqNum::new(4))
            .await
            .unwrap();
        let seqs: Vec<u64> = range.iter().map(|(s, _)| s.value()).collect();
        assert_eq!(seqs, vec![2, 3, 4]);
        assert_eq!(&range[0].1[..], b"msg2");
    }

    #[tokio::test]
    async fn test_memory_store_empty_range() {
        let store = MemoryStore::new();
        store_n(&store, 2).await;
        assert!(
            store
                .get_messages(SeqNum::new(5), SeqNum::new(4))
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            store
                .get_messages(SeqNum::new(10), SeqNum::new(20))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_memory_store_counters() {
        let store = MemoryStore::new();
        store.set_next_sender_seq(SeqNum::new(10));
        store.set_next_target_seq(SeqNum::new(20));
        store.incr_next_sender_seq();
        store.incr_next_target_seq();

        assert_eq!(store.next_sender_seq(), SeqNum::new(11));
        assert_eq!(store.next_target_seq(), SeqNum::new(21));
    }

    #[tokio::test]
    async fn test_memory_store_reset() {
        let store = MemoryStore::new();
        store_n(&store, 3).await;
        store.set_next_target_seq(SeqNum::new(20));

        store.reset().await.unwrap();

        assert_eq!(store.message_count(), 0);
        assert_eq!(store.next_sender_seq(), SeqNum::new(1));
        assert_eq!(store.next_target_seq(), SeqNum::new(1));
    }
}
