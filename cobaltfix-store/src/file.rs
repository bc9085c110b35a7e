/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! File-backed message store implementation.
//!
//! Each session persists into four files sharing a per-session prefix:
//!
//! - `<prefix>.session`: JSON record with the store creation time
//! - `<prefix>.seqnums`: text `sender:target` counter snapshot
//! - `<prefix>.body`: concatenated outbound message bytes
//! - `<prefix>.idx`: text `seq,offset,len` lines locating each message
//!
//! The body log is append-only and the index stays dense, so a resend range
//! is a straight sequence of reads. Counter updates rewrite the small seqnums
//! file in place. Writes are small appends followed by a flush; callers that
//! cannot tolerate any blocking on the session task should wrap store calls
//! in `spawn_blocking`.

use crate::traits::MessageStore;
use async_trait::async_trait;
use bytes::Bytes;
use cobaltfix_core::error::StoreError;
use cobaltfix_core::types::SeqNum;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// JSON record stored in the `.session` file.
#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    /// Store creation time as milliseconds since the Unix epoch.
    creation_time_ms: u64,
}

#[derive(Debug)]
struct Paths {
    session: PathBuf,
    seqnums: PathBuf,
    body: PathBuf,
    idx: PathBuf,
}

#[derive(Debug)]
struct Inner {
    next_sender: u64,
    next_target: u64,
    /// seq -> (offset, len) into the body log.
    index: BTreeMap<u64, (u64, u64)>,
    body_len: u64,
    creation_time: SystemTime,
    paths: Paths,
}

/// File-backed message store.
#[derive(Debug)]
pub struct FileStore {
    inner: Mutex<Inner>,
}

impl FileStore {
    /// Opens (or creates) the store for the given directory and session
    /// prefix, e.g. `FIX.4.4-SENDER-TARGET`.
    ///
    /// # Errors
    /// Returns `StoreError` if the files cannot be created or an existing
    /// store cannot be read.
    pub fn open(dir: impl AsRef<Path>, prefix: &str) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let paths = Paths {
            session: dir.join(format!("{prefix}.session")),
            seqnums: dir.join(format!("{prefix}.seqnums")),
            body: dir.join(format!("{prefix}.body")),
            idx: dir.join(format!("{prefix}.idx")),
        };

        let creation_time = load_or_init_session(&paths.session)?;
        let (next_sender, next_target) = load_or_init_seqnums(&paths.seqnums)?;
        let index = load_index(&paths.idx)?;
        let body_len = match fs::metadata(&paths.body) {
            Ok(meta) => meta.len(),
            Err(_) => {
                File::create(&paths.body)?;
                0
            }
        };

        debug!(
            prefix,
            next_sender,
            next_target,
            messages = index.len(),
            "opened file store"
        );

        Ok(Self {
            inner: Mutex::new(Inner {
                next_sender,
                next_target,
                index,
                body_len,
                creation_time,
                paths,
            }),
        })
    }

    /// Returns the number of indexed messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.inner.lock().index.len()
    }
}

#[async_trait]
impl MessageStore for FileStore {
    fn next_sender_seq(&self) -> SeqNum {
        SeqNum::new(self.inner.lock().next_sender)
    }

    fn next_target_seq(&self) -> SeqNum {
        SeqNum::new(self.inner.lock().next_target)
    }

    fn incr_next_sender_seq(&self) {
        let mut inner = self.inner.lock();
        inner.next_sender += 1;
        persist_seqnums(&inner);
    }

    fn incr_next_target_seq(&self) {
        let mut inner = self.inner.lock();
        inner.next_target += 1;
        persist_seqnums(&inner);
    }

    fn set_next_sender_seq(&self, seq: SeqNum) {
        let mut inner = self.inner.lock();
        inner.next_sender = seq.value();
        persist_seqnums(&inner);
    }

    fn set_next_target_seq(&self, seq: SeqNum) {
        let mut inner = self.inner.lock();
        inner.next_target = seq.value();
        persist_seqnums(&inner);
    }

    async fn save_message(&self, seq_num: SeqNum, message: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if seq_num.value() != inner.next_sender {
            return Err(StoreError::OutOfSequence {
                expected: SeqNum::new(inner.next_sender),
                got: seq_num,
            });
        }

        let offset = inner.body_len;
        let len = message.len() as u64;

        let mut body = OpenOptions::new().append(true).open(&inner.paths.body)?;
        body.write_all(message)?;
        body.flush()?;

        let mut idx = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&inner.paths.idx)?;
        writeln!(idx, "{seq_num},{offset},{len}")?;
        idx.flush()?;

        inner.index.insert(seq_num.value(), (offset, len));
        inner.body_len += len;
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
        let inner = self.inner.lock();
        let mut body = File::open(&inner.paths.body)?;
        let mut result = Vec::new();
        for (&seq, &(offset, len)) in inner.index.range(begin.value()..=end.value()) {
            let mut buf = vec![0u8; len as usize];
            body.seek(SeekFrom::Start(offset))?;
            body.read_exact(&mut buf).map_err(|_| StoreError::Corrupted {
                reason: format!("body log truncated at seq {seq}"),
            })?;
            result.push((SeqNum::new(seq), Bytes::from(buf)));
        }
        Ok(result)
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        File::create(&inner.paths.body)?;
        File::create(&inner.paths.idx)?;
        inner.index.clear();
        inner.body_len = 0;
        inner.next_sender = 1;
        inner.next_target = 1;
        inner.creation_time = SystemTime::now();
        write_session(&inner.paths.session, inner.creation_time)?;
        write_seqnums(&inner.paths.seqnums, 1, 1)?;
        Ok(())
    }

    fn creation_time(&self) -> SystemTime {
        self.inner.lock().creation_time
    }

    async fn refresh(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let (sender, target) = load_or_init_seqnums(&inner.paths.seqnums)?;
        inner.next_sender = sender;
        inner.next_target = target;
        inner.index = load_index(&inner.paths.idx)?;
        inner.body_len = fs::metadata(&inner.paths.body)?.len();
        Ok(())
    }
}

fn load_or_init_session(path: &Path) -> Result<SystemTime, StoreError> {
    if path.exists() {
        let data = fs::read_to_string(path)?;
        let record: SessionRecord =
            serde_json::from_str(&data).map_err(|e| StoreError::Corrupted {
                reason: format!("invalid session record: {e}"),
            })?;
        Ok(UNIX_EPOCH + Duration::from_millis(record.creation_time_ms))
    } else {
        let now = SystemTime::now();
        write_session(path, now)?;
        Ok(now)
    }
}

fn write_session(path: &Path, creation_time: SystemTime) -> Result<(), StoreError> {
    let record = SessionRecord {
        creation_time_ms: creation_time
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64,
    };
    let data = serde_json::to_string(&record).map_err(|e| StoreError::Io(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

fn load_or_init_seqnums(path: &Path) -> Result<(u64, u64), StoreError> {
    if path.exists() {
        let data = fs::read_to_string(path)?;
        let (sender, target) = data
            .trim()
            .split_once(':')
            .ok_or_else(|| StoreError::Corrupted {
                reason: "seqnums file must contain sender:target".to_string(),
            })?;
        let sender = sender.parse().map_err(|_| StoreError::Corrupted {
            reason: format!("invalid sender counter '{sender}'"),
        })?;
        let target = target.parse().map_err(|_| StoreError::Corrupted {
            reason: format!("invalid target counter '{target}'"),
        })?;
        Ok((sender, target))
    } else {
        write_seqnums(path, 1, 1)?;
        Ok((1, 1))
    }
}

fn write_seqnums(path: &Path, sender: u64, target: u64) -> Result<(), StoreError> {
    fs::write(path, format!("{sender}:{target}\n"))?;
    Ok(())
}

/// Best-effort counter persistence from the sync counter methods. A failure
/// here leaves the on-disk snapshot stale; the next save or refresh surfaces
/// the underlying fault.
fn persist_seqnums(inner: &Inner) {
    if let Err(e) = write_seqnums(&inner.paths.seqnums, inner.next_sender, inner.next_target) {
        debug!(error = %e, "failed to persist sequence counters");
    }
}

fn load_index(path: &Path) -> Result<BTreeMap<u64, (u64, u64)>, StoreError> {
    let mut index = BTreeMap::new();
    if !path.exists() {
        return Ok(index);
    }
    let data = fs::read_to_string(path)?;
    for line in data.lines() {
        let mut parts = line.splitn(3, ',');
        let (Some(seq), Some(offset), Some(len)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(StoreError::Corrupted {
                reason: format!("malformed index line '{line}'"),
            });
        };
        let parse = |s: &str| {
            s.parse::<u64>().map_err(|_| StoreError::Corrupted {
                reason: format!("malformed index line '{line}'"),
            })
        };
        index.insert(parse(seq)?, (parse(offset)?, parse(len)?));
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn temp_dir(name: &str) -> PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "cobaltfix-store-{}-{}-{}",
            name,
            std::process::id(),
            id
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    async fn store_n(store: &FileStore, n: u64) {
        for seq in 1..=n {
            store
                .save_message(SeqNum::new(seq), format!("msg{seq}").as_bytes())
                .await
                .unwrap();
            store.incr_next_sender_seq();
        }
    }

    #[tokio::test]
    async fn test_file_store_save_and_read() {
        let dir = temp_dir("save");
        let store = FileStore::open(&dir, "FIX.4.4-A-B").unwrap();
        store_n(&store, 3).await;

        let msgs = store
            .get_messages(SeqNum::new(1), SeqNum::new(3))
            .await
            .unwrap();
        assert_eq!(msgs.len(), 3);
        assert_eq!(&msgs[0].1[..], b"msg1");
        assert_eq!(&msgs[2].1[..], b"msg3");

        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_file_store_rejects_out_of_sequence() {
        let dir = temp_dir("oos");
        let store = FileStore::open(&dir, "FIX.4.4-A-B").unwrap();
        let err = store.save_message(SeqNum::new(3), b"skip").await.unwrap_err();
        assert_eq!(
            err,
            StoreError::OutOfSequence {
                expected: SeqNum::new(1),
                got: SeqNum::new(3)
            }
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = temp_dir("reopen");
        {
            let store = FileStore::open(&dir, "FIX.4.4-A-B").unwrap();
            store_n(&store, 5).await;
            store.set_next_target_seq(SeqNum::new(9));
        }

        let store = FileStore::open(&dir, "FIX.4.4-A-B").unwrap();
        assert_eq!(store.next_sender_seq(), SeqNum::new(6));
        assert_eq!(store.next_target_seq(), SeqNum::new(9));
        assert_eq!(store.message_count(), 5);

        let msgs = store
            .get_messages(SeqNum::new(2), SeqNum::new(4))
            .await
            .unwrap();
        let seqs: Vec<u64> = msgs.iter().map(|(s, _)| s.value()).collect();
        assert_eq!(seqs, vec![2, 3, 4]);

        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_file_store_reset() {
        let dir = temp_dir("reset");
        let store = FileStore::open(&dir, "FIX.4.4-A-B").unwrap();
        store_n(&store, 3).await;

        store.reset().await.unwrap();
        assert_eq!(store.next_sender_seq(), SeqNum::new(1));
        assert_eq!(store.next_target_seq(), SeqNum::new(1));
        assert_eq!(store.message_count(), 0);
        assert!(
            store
                .get_messages(SeqNum::new(1), SeqNum::new(10))
                .await
                .unwrap()
                .is_empty()
        );

        // Reset persists across reopen.
        drop(store);
        let store = FileStore::open(&dir, "FIX.4.4-A-B").unwrap();
        assert_eq!(store.next_sender_seq(), SeqNum::new(1));

        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_file_store_refresh() {
        let dir = temp_dir("refresh");
        let store = FileStore::open(&dir, "FIX.4.4-A-B").unwrap();
        store_n(&store, 2).await;

        // A second handle sees the first handle's writes after refresh.
        let other = FileStore::open(&dir, "FIX.4.4-A-B").unwrap();
        store.save_message(SeqNum::new(3), b"msg3").await.unwrap();
        store.incr_next_sender_seq();
        other.refresh().await.unwrap();
        assert_eq!(other.next_sender_seq(), SeqNum::new(4));
        assert_eq!(other.message_count(), 3);

        let _ = fs::remove_dir_all(dir);
    }
}
