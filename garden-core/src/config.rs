//! Garden configuration: the memories, their unlock order, the progress
//! subtitles and a few settings.
//!
//! Configuration is a JSON document shaped like the personalisation file the
//! site is edited through:
//!
//! ```json
//! {
//!   "memories": [
//!     { "id": 1, "title": "First date", "mediaType": "video",
//!       "media": ["assets/memories/memory_1/video.mp4"], "unlocked": true },
//!     { "id": 2, "title": "The Last Memory", "mediaType": "special",
//!       "specialType": "proposal" }
//!   ],
//!   "unlockRules": null,
//!   "progressSubtitles": { "0": "Begin...", "1": "The first rose..." },
//!   "settings": { "storageKey": "rose_garden_state", "autoSaveDelayMs": 500 }
//! }
//! ```

use crate::memory::{Memory, MemoryId};
use crate::progress::SubtitleThresholds;
use crate::unlock::UnlockGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

/// Default key under which progress is stored.
pub const DEFAULT_STORAGE_KEY: &str = "rose_garden_state";

/// Default quiet period before a save is written.
pub const DEFAULT_AUTO_SAVE_DELAY_MS: u64 = 500;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The garden has no memories")]
    NoMemories,

    #[error("Duplicate memory id: {0}")]
    DuplicateId(MemoryId),

    #[error("Progress subtitles need a fallback at threshold 0")]
    MissingFallbackSubtitle,

    #[error("Storage key must not be empty")]
    EmptyStorageKey,
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Key under which progress is persisted.
    pub storage_key: String,

    /// Debounce delay for saves, in milliseconds.
    pub auto_save_delay_ms: u64,
}

impl Settings {
    pub fn auto_save_delay(&self) -> Duration {
        Duration::from_millis(self.auto_save_delay_ms)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            auto_save_delay_ms: DEFAULT_AUTO_SAVE_DELAY_MS,
        }
    }
}

/// Static configuration of a garden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenConfig {
    /// Canonical memory list, in unlock order. The `unlocked` flag marks the
    /// initial memories; any `completed` flag is ignored.
    pub memories: Vec<Memory>,

    /// Explicit unlock rules. `None` chains the memories in order.
    #[serde(default)]
    pub unlock_rules: Option<BTreeMap<MemoryId, Vec<MemoryId>>>,

    #[serde(default)]
    pub progress_subtitles: SubtitleThresholds,

    #[serde(default)]
    pub settings: Settings,
}

impl GardenConfig {
    /// Create a config with the given memories and default everything else.
    pub fn new(memories: Vec<Memory>) -> Self {
        Self {
            memories,
            unlock_rules: None,
            progress_subtitles: SubtitleThresholds::default(),
            settings: Settings::default(),
        }
    }

    /// Parse a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    /// Use explicit unlock rules instead of the sequential chain.
    pub fn with_unlock_rules(mut self, rules: BTreeMap<MemoryId, Vec<MemoryId>>) -> Self {
        self.unlock_rules = Some(rules);
        self
    }

    /// Set the progress subtitles.
    pub fn with_subtitles(mut self, subtitles: SubtitleThresholds) -> Self {
        self.progress_subtitles = subtitles;
        self
    }

    /// Set the storage key.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.settings.storage_key = key.into();
        self
    }

    /// Set the save debounce delay.
    pub fn with_auto_save_delay(mut self, delay: Duration) -> Self {
        self.settings.auto_save_delay_ms = delay.as_millis() as u64;
        self
    }

    /// The unlock graph this configuration describes.
    pub fn unlock_graph(&self) -> UnlockGraph {
        UnlockGraph::build(&self.memories, self.unlock_rules.as_ref())
    }

    /// The memories in their starting state: configured unlock flags, nothing
    /// completed.
    pub fn canonical_memories(&self) -> Vec<Memory> {
        self.memories
            .iter()
            .cloned()
            .map(|mut memory| {
                memory.completed = false;
                memory
            })
            .collect()
    }

    /// Check the configuration. Recoverable oddities are logged, not rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memories.is_empty() {
            return Err(ConfigError::NoMemories);
        }

        let mut seen = HashSet::with_capacity(self.memories.len());
        for memory in &self.memories {
            if !seen.insert(memory.id) {
                return Err(ConfigError::DuplicateId(memory.id));
            }
        }

        if !self.progress_subtitles.has_fallback() {
            return Err(ConfigError::MissingFallbackSubtitle);
        }

        if self.settings.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }

        if !self.memories.iter().any(|m| m.unlocked) {
            tracing::warn!("No memory is initially unlocked; the garden cannot be started");
        }

        for (from, to) in self.unlock_graph().dangling(&self.memories) {
            tracing::warn!(%from, %to, "Unlock rule names an unknown memory; it will be ignored");
        }

        if let Some(last) = self.memories.last() {
            if !last.is_proposal() {
                tracing::debug!(id = %last.id, "Last memory is not the proposal trigger");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "memories": [
            { "id": 1, "title": "Memory 1 Title", "mediaType": "video",
              "media": ["assets/memories/memory_1/video.mp4"],
              "caption": "Describe this memory...",
              "position": { "lat": 39.8365, "lng": -77.2330 },
              "unlocked": true, "completed": false },
            { "id": 2, "title": "Memory 2 Title", "mediaType": "images",
              "media": ["assets/memories/memory_2/photo1.jpg"],
              "position": { "lat": 39.8367, "lng": -77.2324 } },
            { "id": 4, "title": "The Last Memory", "mediaType": "special",
              "specialType": "proposal", "media": [] }
        ],
        "unlockRules": null,
        "progressSubtitles": { "0": "A", "3": "B", "5": "C" },
        "settings": { "autoSaveDelayMs": 250 }
    }"#;

    #[test]
    fn test_parse_sample() {
        let config = GardenConfig::from_json(SAMPLE).unwrap();

        assert_eq!(config.memories.len(), 3);
        assert!(config.memories[0].unlocked);
        assert!(config.memories[2].is_proposal());
        assert_eq!(config.unlock_rules, None);
        assert_eq!(config.progress_subtitles.select(4), "B");
        assert_eq!(config.settings.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.settings.auto_save_delay(), Duration::from_millis(250));
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = GardenConfig::from_json(r#"{"memories": [{"id": 1, "unlocked": true}]}"#).unwrap();
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.progress_subtitles, SubtitleThresholds::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_explicit_unlock_rules_parse() {
        let json = r#"{
            "memories": [{"id": 1, "unlocked": true}, {"id": 2}, {"id": 3}],
            "unlockRules": { "1": [2, 3], "2": [], "3": [] }
        }"#;
        let config = GardenConfig::from_json(json).unwrap();
        let graph = config.unlock_graph();
        assert_eq!(
            graph.successors(MemoryId::new(1)),
            &[MemoryId::new(2), MemoryId::new(3)]
        );
    }

    #[test]
    fn test_rejects_empty_garden() {
        let config = GardenConfig::new(vec![]);
        assert!(matches!(config.validate(), Err(ConfigError::NoMemories)));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let config = GardenConfig::new(vec![
            Memory::new(1, "One").unlocked(),
            Memory::new(2, "Two"),
            Memory::new(1, "Again"),
        ]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateId(id)) if id == MemoryId::new(1)
        ));
    }

    #[test]
    fn test_rejects_missing_fallback_subtitle() {
        let config = GardenConfig::new(vec![Memory::new(1, "One").unlocked()])
            .with_subtitles(SubtitleThresholds::from_pairs([(1, "later")]));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingFallbackSubtitle)
        ));
    }

    #[test]
    fn test_rejects_empty_storage_key() {
        let config = GardenConfig::new(vec![Memory::new(1, "One").unlocked()]).with_storage_key("  ");
        assert!(matches!(config.validate(), Err(ConfigError::EmptyStorageKey)));
    }

    #[test]
    fn test_dangling_rules_are_accepted() {
        let mut rules = BTreeMap::new();
        rules.insert(MemoryId::new(1), vec![MemoryId::new(42)]);
        let config = GardenConfig::new(vec![Memory::new(1, "One").unlocked()]).with_unlock_rules(rules);
        config.validate().unwrap();
    }

    #[test]
    fn test_canonical_memories_ignore_completed_flag() {
        let mut memory = Memory::new(1, "One").unlocked();
        memory.completed = true;
        let config = GardenConfig::new(vec![memory]);

        let canonical = config.canonical_memories();
        assert!(canonical[0].unlocked);
        assert!(!canonical[0].completed);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("garden.json");
        std::fs::write(&path, SAMPLE).expect("Write should succeed");

        let config = GardenConfig::load(&path).await.expect("Load should succeed");
        assert_eq!(config.memories.len(), 3);

        let missing = GardenConfig::load(temp_dir.path().join("missing.json")).await;
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
