//! Memory records: the unlockable pins of the garden.
//!
//! The core only cares about `id`, `unlocked` and `completed`. Everything else
//! on a memory is presentation payload carried through untouched.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a memory. Also its ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(u32);

impl MemoryId {
    /// Wrap a raw id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw id.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for MemoryId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MemoryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// How a memory's media should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// A single video.
    Video,
    /// One or more photos.
    #[default]
    Images,
    /// A scripted screen rather than media (see [`SpecialType`]).
    Special,
}

/// Scripted behaviours for `MediaType::Special` memories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialType {
    /// The final pin that triggers the proposal flow.
    Proposal,
}

/// Map coordinates of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

/// Presentation payload of a memory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryContent {
    /// Short name shown in the modal header.
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub media_type: MediaType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_type: Option<SpecialType>,

    /// Paths of the photos or video, relative to the site root.
    #[serde(default)]
    pub media: Vec<String>,

    #[serde(default)]
    pub caption: String,

    #[serde(default)]
    pub position: Position,
}

/// Display state of a pin, derived from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinState {
    Locked,
    Unlocked,
    Completed,
}

impl PinState {
    /// Lowercase name, as used in CSS classes and logs.
    pub fn name(self) -> &'static str {
        match self {
            PinState::Locked => "locked",
            PinState::Unlocked => "unlocked",
            PinState::Completed => "completed",
        }
    }
}

impl fmt::Display for PinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One unlockable pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: MemoryId,

    /// Whether the pin can be opened.
    #[serde(default)]
    pub unlocked: bool,

    /// Whether the pin has been viewed to the end.
    #[serde(default)]
    pub completed: bool,

    #[serde(flatten)]
    pub content: MemoryContent,
}

impl Memory {
    /// Create a locked, uncompleted memory with empty content.
    pub fn new(id: u32, title: impl Into<String>) -> Self {
        Self {
            id: MemoryId(id),
            unlocked: false,
            completed: false,
            content: MemoryContent {
                title: title.into(),
                ..MemoryContent::default()
            },
        }
    }

    /// Mark this memory as initially unlocked.
    pub fn unlocked(mut self) -> Self {
        self.unlocked = true;
        self
    }

    /// Set the media type and paths.
    pub fn with_media(mut self, media_type: MediaType, media: Vec<String>) -> Self {
        self.content.media_type = media_type;
        self.content.media = media;
        self
    }

    /// Set the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.content.caption = caption.into();
        self
    }

    /// Set the map position.
    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.content.position = Position { lat, lng };
        self
    }

    /// Turn this memory into the proposal trigger.
    pub fn proposal(mut self) -> Self {
        self.content.media_type = MediaType::Special;
        self.content.special_type = Some(SpecialType::Proposal);
        self.content.media.clear();
        self
    }

    pub fn title(&self) -> &str {
        &self.content.title
    }

    /// Whether this is the proposal trigger pin.
    pub fn is_proposal(&self) -> bool {
        self.content.special_type == Some(SpecialType::Proposal)
    }

    /// Derived display state.
    pub fn pin_state(&self) -> PinState {
        if self.completed {
            PinState::Completed
        } else if self.unlocked {
            PinState::Unlocked
        } else {
            PinState::Locked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_state() {
        let mut memory = Memory::new(1, "First date");
        assert_eq!(memory.pin_state(), PinState::Locked);

        memory.unlocked = true;
        assert_eq!(memory.pin_state(), PinState::Unlocked);

        memory.completed = true;
        assert_eq!(memory.pin_state(), PinState::Completed);
    }

    #[test]
    fn test_proposal_builder() {
        let memory = Memory::new(4, "The Last Memory")
            .with_media(MediaType::Images, vec!["a.jpg".to_string()])
            .proposal();

        assert!(memory.is_proposal());
        assert_eq!(memory.content.media_type, MediaType::Special);
        assert!(memory.content.media.is_empty());
    }

    #[test]
    fn test_memory_deserializes_flat_payload() {
        let json = r#"{
            "id": 2,
            "title": "Memory 2 Title",
            "mediaType": "images",
            "media": ["assets/memories/memory_2/photo1.jpg"],
            "caption": "Describe this memory...",
            "position": { "lat": 39.8367, "lng": -77.2324 },
            "unlocked": false,
            "completed": false
        }"#;

        let memory: Memory = serde_json::from_str(json).unwrap();
        assert_eq!(memory.id, MemoryId::new(2));
        assert_eq!(memory.title(), "Memory 2 Title");
        assert_eq!(memory.content.media.len(), 1);
        assert_eq!(memory.content.position.lng, -77.2324);
        assert!(!memory.is_proposal());
    }

    #[test]
    fn test_special_type_parses() {
        let json = r#"{"id": 4, "mediaType": "special", "specialType": "proposal"}"#;
        let memory: Memory = serde_json::from_str(json).unwrap();
        assert!(memory.is_proposal());
        assert!(!memory.unlocked);
    }

    #[test]
    fn test_memory_id_from_str() {
        let id: MemoryId = " 7 ".parse().unwrap();
        assert_eq!(id.get(), 7);
        assert!("seven".parse::<MemoryId>().is_err());
    }
}
