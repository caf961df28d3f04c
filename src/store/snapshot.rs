//! # Snapshot Persistence
//!
//! The durable backing store behind [`SecretStore`](super::SecretStore).
//!
//! The store only ever needs two things from persistence: the full snapshot
//! at startup and an atomic overwrite of the full snapshot after a mutation.
//! [`SnapshotStore`] captures exactly that, so the serialize-and-write step can
//! be replaced (incremental, async, remote) without touching store logic.

use async_trait::async_trait;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Snapshot persistence errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to replace snapshot file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("snapshot task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Durable storage for the full secret snapshot
#[async_trait]
pub trait SnapshotStore: Send + Sync + fmt::Debug {
    /// Read the full snapshot. An absent snapshot is an empty blob.
    async fn load(&self) -> Result<Vec<u8>, SnapshotError>;

    /// Atomically replace the full snapshot with `contents`
    async fn save(&self, contents: &[u8]) -> Result<(), SnapshotError>;
}

/// Snapshot stored in a single file on the local filesystem
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make sure the backing file exists, creating an empty one if absent.
    ///
    /// Returns `true` when the file was created. Contents are not validated here.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be created, or exists but cannot be opened.
    pub fn ensure_exists(&self) -> Result<bool, SnapshotError> {
        match fs::metadata(&self.path) {
            Ok(_) => {
                fs::File::open(&self.path)?;
                Ok(false)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::File::create(&self.path)?;
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshot {
    async fn load(&self) -> Result<Vec<u8>, SnapshotError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, contents: &[u8]) -> Result<(), SnapshotError> {
        let path = self.path.clone();
        let contents = contents.to_vec();
        tokio::task::spawn_blocking(move || replace_file(&path, &contents)).await?
    }
}

/// Write `contents` to a temp file next to `path`, then rename it over `path`
fn replace_file(path: &Path, contents: &[u8]) -> Result<(), SnapshotError> {
    // Same directory, so the rename stays on one filesystem
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}

/// In-memory snapshot, for tests and embedding without a filesystem
#[derive(Default)]
pub struct MemorySnapshot {
    contents: Mutex<Vec<u8>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl fmt::Debug for MemorySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySnapshot")
            .field("len", &self.contents().len())
            .field("saves", &self.save_count())
            .finish_non_exhaustive()
    }
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing snapshot blob
    pub fn with_contents(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: Mutex::new(contents.into()),
            ..Self::default()
        }
    }

    /// Current snapshot bytes
    pub fn contents(&self) -> Vec<u8> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail (or succeed again)
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshot {
    async fn load(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(self.contents())
    }

    async fn save(&self, contents: &[u8]) -> Result<(), SnapshotError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(io::Error::other("snapshot writes disabled").into());
        }
        *self
            .contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = contents.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_exists_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        let snapshot = FileSnapshot::new(&path);

        assert!(snapshot.ensure_exists().unwrap());
        assert!(path.exists());
        assert_eq!(fs::read(&path).unwrap().len(), 0);

        // Second call leaves the existing file alone
        fs::write(&path, b"{}").unwrap();
        assert!(!snapshot.ensure_exists().unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"{}");
    }

    #[test]
    fn test_ensure_exists_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = FileSnapshot::new(dir.path().join("missing").join("secrets.json"));

        assert!(snapshot.ensure_exists().is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = FileSnapshot::new(dir.path().join("absent.json"));

        assert!(snapshot.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        fs::write(&path, b"old contents that are longer than the new ones").unwrap();

        let snapshot = FileSnapshot::new(&path);
        snapshot.save(b"{}").await.unwrap();

        assert_eq!(snapshot.load().await.unwrap(), b"{}");
        // Only the target file remains, no stray temp files
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_memory_snapshot_failure_toggle() {
        let snapshot = MemorySnapshot::with_contents(b"{}".to_vec());

        snapshot.fail_saves(true);
        assert!(snapshot.save(b"new").await.is_err());
        assert_eq!(snapshot.contents(), b"{}");
        assert_eq!(snapshot.save_count(), 0);

        snapshot.fail_saves(false);
        snapshot.save(b"new").await.unwrap();
        assert_eq!(snapshot.load().await.unwrap(), b"new");
        assert_eq!(snapshot.save_count(), 1);
    }
}
