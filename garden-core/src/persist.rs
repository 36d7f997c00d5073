//! Persistence of garden progress.
//!
//! Only the flags of each memory are stored, never the content, so a saved
//! state survives edits to the garden configuration. Stores are key/value
//! string stores in the manner of browser local storage.

use crate::memory::{Memory, MemoryId};
use crate::screen::Screen;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Persisted flags of one memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMemory {
    pub id: MemoryId,
    pub unlocked: bool,
    pub completed: bool,
}

impl From<&Memory> for SavedMemory {
    fn from(memory: &Memory) -> Self {
        Self {
            id: memory.id,
            unlocked: memory.unlocked,
            completed: memory.completed,
        }
    }
}

/// The persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    pub memories: Vec<SavedMemory>,

    /// Screen name; unknown names load as the landing screen.
    #[serde(default)]
    pub current_screen: Option<String>,

    /// Informational only. Recomputed from `memories` on load.
    #[serde(default)]
    pub completed_count: usize,

    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_updated: u64,
}

impl SavedState {
    /// Snapshot the flags of `memories`.
    pub fn capture(memories: &[Memory], screen: Screen, completed_count: usize) -> Self {
        Self {
            memories: memories.iter().map(SavedMemory::from).collect(),
            current_screen: Some(screen.name().to_string()),
            completed_count,
            last_updated: now_millis(),
        }
    }

    /// Parse stored text.
    pub fn from_json(text: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Saved record for `id`, if any.
    pub fn find(&self, id: MemoryId) -> Option<&SavedMemory> {
        self.memories.iter().find(|m| m.id == id)
    }

    /// Stamp with the current time.
    pub fn touch(&mut self) {
        self.last_updated = now_millis();
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// A string key/value store for saved state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the value under `key`. `Ok(None)` when nothing is stored.
    async fn load(&self, key: &str) -> Result<Option<String>, PersistError>;

    /// Replace the value under `key`.
    async fn save(&self, key: &str, value: &str) -> Result<(), PersistError>;

    /// Delete the value under `key`. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), PersistError>;
}

/// In-process store. Counts writes so tests can observe debouncing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with `value` under `key`.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::default();
        store.put(key, value);
        store
    }

    /// Write directly, bypassing the write counter.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries_guard().insert(key.into(), value.into());
    }

    /// Read directly.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries_guard().get(key).cloned()
    }

    /// Number of successful `save` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every operation fail, as a full or disabled storage would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), PersistError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PersistError::Unavailable("memory store disabled".to_string()));
        }
        Ok(())
    }

    fn entries_guard(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        self.check_available()?;
        Ok(self.get(key))
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), PersistError> {
        self.check_available()?;
        self.put(key, value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistError> {
        self.check_available()?;
        self.entries_guard().remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let sanitized = key
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect::<String>();
        self.dir.join(format!("{sanitized}.json"))
    }
}

#[async_trait]
impl StateStore for FileStore {
    async fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
