//! Derived progress metrics and the subtitle shown above the progress bar.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Progress through the garden. Always derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Number of completed memories.
    pub count: usize,
    /// Total number of memories.
    pub total: usize,
    /// `100 * count / total`.
    pub percentage: f64,
    /// Subtitle for the current count.
    pub subtitle: String,
}

impl Progress {
    /// The `count/total` counter text.
    pub fn counter(&self) -> String {
        format!("{}/{}", self.count, self.total)
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.count == self.total
    }
}

/// Percentage of `count` over `total`, zero for an empty garden.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 * 100.0 / total as f64
}

/// Completion-count thresholds mapped to subtitle text.
///
/// The subtitle for a count is the text of the highest threshold that does not
/// exceed it. Threshold 0 is the fallback and must be present; see
/// [`crate::config::GardenConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubtitleThresholds(BTreeMap<u32, String>);

impl SubtitleThresholds {
    /// Build from `(threshold, text)` pairs.
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (u32, S)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k, v.into())).collect())
    }

    /// Subtitle for `count` completed memories.
    pub fn select(&self, count: usize) -> &str {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        self.0
            .range(..=count)
            .next_back()
            .map(|(_, text)| text.as_str())
            .unwrap_or("")
    }

    /// Whether the mandatory threshold 0 is configured.
    pub fn has_fallback(&self) -> bool {
        self.0.contains_key(&0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SubtitleThresholds {
    fn default() -> Self {
        Self::from_pairs([
            (0, "Begin your journey through our memories..."),
            (1, "The first rose begins to bloom..."),
            (3, "Our story is unfolding beautifully..."),
            (5, "Halfway through our garden of memories..."),
            (7, "So many cherished moments together..."),
            (9, "One final rose remains... the most important one"),
        ])
    }
}
