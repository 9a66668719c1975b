//! Durable backends for the persisted session record.
//!
//! The record is a single JSON document stored under [`SESSION_RECORD_KEY`].
//! Backends only move raw text around; parsing and the corrupt-record policy
//! belong to [`SessionStore`](super::SessionStore).

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fixed key the session record is stored under.
pub const SESSION_RECORD_KEY: &str = "auth";

/// Key-value storage that survives process restarts.
///
/// Implementations must be cheap to call synchronously: session mutations
/// never suspend.
pub trait SessionStorage: Send + Sync {
    /// Read the raw record, `Ok(None)` when nothing is stored.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the record.
    fn save(&self, key: &str, record: &str) -> Result<()>;

    /// Delete the record. Removing a missing record is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Whether this backend is real durable storage, i.e. the process runs
    /// in an interactive context. Non-interactive contexts get `false` and
    /// the session store skips hydration entirely.
    fn is_durable(&self) -> bool {
        true
    }
}

// ── File backend ────────────────────────────────────────────────

/// One JSON file per key inside a data directory (`<dir>/<key>.json`).
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SessionStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.record_path(key);
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn save(&self, key: &str, record: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.record_path(key);
        std::fs::write(&path, record)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.record_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

// ── In-memory backend ───────────────────────────────────────────

/// Process-local storage. Clones share the same records, so two session
/// stores built from clones behave like two runs over one durable store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw text currently stored under `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.records.lock().get(key).cloned()
    }

    /// Seed a raw record, bypassing any serialization.
    pub fn put(&self, key: &str, record: impl Into<String>) {
        self.records.lock().insert(key.to_string(), record.into());
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, record: &str) -> Result<()> {
        self.put(key, record);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.records.lock().remove(key);
        Ok(())
    }
}

// ── Non-interactive backend ─────────────────────────────────────

/// Storage for non-interactive contexts (batch jobs, server-side rendering):
/// nothing is read and writes are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStorage;

impl SessionStorage for NoopStorage {
    fn load(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn save(&self, _key: &str, _record: &str) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }
}

// ── Tests ───────────────────────────────────────────────────────
