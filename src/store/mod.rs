//! # Secret Store
//!
//! In-memory burn-after-read secret store with write-through persistence.
//!
//! - Secrets are keyed by their MD5 fingerprint, so storing the same plaintext
//!   twice yields the same id and overwrites the earlier entry.
//! - [`SecretStore::take`] removes the secret it returns. Concurrent takes of
//!   the same id are serialized by the store lock; exactly one caller wins.
//! - Every insert serializes the whole map and hands it to the
//!   [`SnapshotStore`] while the lock is held. Persistence failures are logged
//!   and never reported to the caller: the in-memory map is the source of truth
//!   for the running process.
//!
//! Takes do not persist by default, so a crash between a take and the next
//! insert brings the taken secret back on restart. Enable `flush_on_take` to
//! close that window at the cost of a file write per retrieval.
//!
//! The fingerprint is also the only access check: anyone able to guess the
//! plaintext can derive its id.

mod snapshot;

pub use snapshot::{FileSnapshot, MemorySnapshot, SnapshotError, SnapshotStore};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Reasons a take can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TakeError {
    /// Caller supplied an empty id
    #[error("secret id must not be empty")]
    EmptyId,

    /// No secret with that id (never stored, or already taken)
    #[error("secret not found")]
    NotFound,
}

/// Compute the id of a secret: lowercase hex MD5 of its UTF-8 bytes
pub fn fingerprint(plaintext: &str) -> String {
    format!("{:x}", md5::compute(plaintext.as_bytes()))
}

/// Process-wide secret store, shared between request handlers via `Arc`
pub struct SecretStore {
    items: Mutex<BTreeMap<String, String>>,
    snapshot: Arc<dyn SnapshotStore>,
    flush_on_take: bool,
}

impl fmt::Debug for SecretStore {
    // Never print plaintexts
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretStore")
            .field("snapshot", &self.snapshot)
            .field("flush_on_take", &self.flush_on_take)
            .finish_non_exhaustive()
    }
}

impl SecretStore {
    /// Open the store, restoring state from `snapshot`.
    ///
    /// A snapshot that cannot be read or parsed is logged and ignored; the
    /// store then starts empty. Startup is never blocked by bad persistence.
    pub async fn open(snapshot: Arc<dyn SnapshotStore>, flush_on_take: bool) -> Self {
        let items = match snapshot.load().await {
            Ok(bytes) => decode_snapshot(&bytes),
            Err(e) => {
                warn!(error = %e, "Failed to read secret snapshot, starting empty");
                BTreeMap::new()
            }
        };

        info!(secrets = items.len(), flush_on_take, "Secret store opened");

        Self {
            items: Mutex::new(items),
            snapshot,
            flush_on_take,
        }
    }

    /// Store `plaintext` and return its id.
    ///
    /// The snapshot is written before this returns. A failed write is logged;
    /// the secret stays stored in memory and the id is still returned.
    pub async fn insert(&self, plaintext: String) -> String {
        let id = fingerprint(&plaintext);

        let mut items = self.items.lock().await;
        if items.insert(id.clone(), plaintext).is_some() {
            debug!("Overwrote existing secret with identical fingerprint");
        }
        self.flush(&items).await;

        id
    }

    /// Remove and return the secret stored under `id`.
    ///
    /// # Errors
    ///
    /// - [`TakeError::EmptyId`] when `id` is empty
    /// - [`TakeError::NotFound`] when nothing is stored under `id`
    pub async fn take(&self, id: &str) -> Result<String, TakeError> {
        if id.is_empty() {
            return Err(TakeError::EmptyId);
        }

        let mut items = self.items.lock().await;
        let plaintext = items.remove(id).ok_or(TakeError::NotFound)?;
        if self.flush_on_take {
            self.flush(&items).await;
        }

        Ok(plaintext)
    }

    /// Whether a secret is currently stored under `id`
    pub async fn contains(&self, id: &str) -> bool {
        self.items.lock().await.contains_key(id)
    }

    /// Number of stored secrets
    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    /// Whether no secrets are stored
    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// Serialize the full map and write it out. Caller holds the lock.
    async fn flush(&self, items: &BTreeMap<String, String>) {
        let result = match serde_json::to_vec_pretty(items) {
            Ok(bytes) => self.snapshot.save(&bytes).await,
            Err(e) => Err(SnapshotError::Encode(e)),
        };

        if let Err(e) = result {
            error!(error = %e, "Failed to persist secret snapshot");
        }
    }
}

/// Parse a snapshot blob. Empty, `null` or unparsable input yields an empty map.
fn decode_snapshot(bytes: &[u8]) -> BTreeMap<String, String> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return BTreeMap::new();
    }

    match serde_json::from_slice::<Option<BTreeMap<String, String>>>(bytes) {
        Ok(items) => items.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Failed to parse secret snapshot, starting empty");
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store(flush_on_take: bool) -> (SecretStore, Arc<MemorySnapshot>) {
        let snapshot = Arc::new(MemorySnapshot::new());
        let shared: Arc<dyn SnapshotStore> = Arc::<MemorySnapshot>::clone(&snapshot);
        let store = SecretStore::open(shared, flush_on_take).await;
        (store, snapshot)
    }

    #[test]
    fn test_fingerprint_is_md5_hex() {
        assert_eq!(fingerprint("hello"), "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(fingerprint(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(fingerprint("hello").len(), 32);
    }

    #[test]
    fn test_decode_snapshot_lenient() {
        assert!(decode_snapshot(b"").is_empty());
        assert!(decode_snapshot(b"  \n").is_empty());
        assert!(decode_snapshot(b"null").is_empty());
        assert!(decode_snapshot(b"{not json").is_empty());
        assert!(decode_snapshot(b"[1, 2, 3]").is_empty());

        let items = decode_snapshot(br#"{"abc": "secret"}"#);
        assert_eq!(items.get("abc").map(String::as_str), Some("secret"));
    }

    #[tokio::test]
    async fn test_insert_then_take_once() {
        let (store, _) = memory_store(false).await;

        let id = store.insert("hello".to_string()).await;
        assert_eq!(id, "5d41402abc4b2a76b9719d911017c592");

        assert_eq!(store.take(&id).await, Ok("hello".to_string()));
        assert_eq!(store.take(&id).await, Err(TakeError::NotFound));
    }

    #[tokio::test]
    async fn test_take_empty_id_is_distinct_from_not_found() {
        let (store, _) = memory_store(false).await;

        assert_eq!(store.take("").await, Err(TakeError::EmptyId));
        assert_eq!(store.take("unknown").await, Err(TakeError::NotFound));
    }

    #[tokio::test]
    async fn test_identical_plaintext_overwrites() {
        let (store, _) = memory_store(false).await;

        let first = store.insert("same".to_string()).await;
        let second = store.insert("same".to_string()).await;

        assert_eq!(first, second);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_reinsert_after_take_recreates_id() {
        let (store, _) = memory_store(false).await;

        let id = store.insert("again".to_string()).await;
        store.take(&id).await.unwrap();
        assert!(!store.contains(&id).await);

        assert_eq!(store.insert("again".to_string()).await, id);
        assert!(store.contains(&id).await);
    }

    #[tokio::test]
    async fn test_insert_writes_pretty_snapshot() {
        let (store, snapshot) = memory_store(false).await;

        store.insert("hello".to_string()).await;

        let expected = "{\n  \"5d41402abc4b2a76b9719d911017c592\": \"hello\"\n}";
        assert_eq!(String::from_utf8(snapshot.contents()).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_take_does_not_flush_by_default() {
        let (store, snapshot) = memory_store(false).await;

        let id = store.insert("hello".to_string()).await;
        assert_eq!(snapshot.save_count(), 1);

        store.take(&id).await.unwrap();
        assert_eq!(snapshot.save_count(), 1);
        assert!(String::from_utf8(snapshot.contents()).unwrap().contains(&id));
    }

    #[tokio::test]
    async fn test_take_flushes_when_enabled() {
        let (store, snapshot) = memory_store(true).await;

        let id = store.insert("hello".to_string()).await;
        store.take(&id).await.unwrap();

        assert_eq!(snapshot.save_count(), 2);
        assert_eq!(snapshot.contents(), b"{}");
    }

    #[tokio::test]
    async fn test_failed_take_does_not_flush() {
        let (store, snapshot) = memory_store(true).await;

        assert!(store.take("missing").await.is_err());
        assert_eq!(snapshot.save_count(), 0);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_secret_in_memory() {
        let (store, snapshot) = memory_store(false).await;
        snapshot.fail_saves(true);

        let id = store.insert("volatile".to_string()).await;

        assert!(snapshot.contents().is_empty());
        assert_eq!(store.take(&id).await, Ok("volatile".to_string()));
    }

    #[tokio::test]
    async fn test_open_restores_snapshot() {
        let snapshot = Arc::new(MemorySnapshot::with_contents(
            br#"{"5d41402abc4b2a76b9719d911017c592": "hello"}"#.to_vec(),
        ));
        let store = SecretStore::open(snapshot, false).await;

        assert_eq!(
            store.take("5d41402abc4b2a76b9719d911017c592").await,
            Ok("hello".to_string())
        );
    }

    #[tokio::test]
    async fn test_debug_does_not_leak_plaintext() {
        let (store, _) = memory_store(false).await;
        store.insert("top-secret-value".to_string()).await;

        let rendered = format!("{store:?}");
        assert!(!rendered.contains("top-secret-value"));
    }
}
