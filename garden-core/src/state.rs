//! The mutable state of a garden and its reconstruction from saved data.

use crate::memory::{Memory, MemoryId};
use crate::persist::SavedState;
use crate::screen::Screen;

/// Outcome of [`GardenState::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Completion {
    Completed,
    Unknown,
    AlreadyCompleted,
    /// Not reachable yet; completing it would skip the unlock order.
    Locked,
}

/// Memories with their current flags, the current screen and the completed
/// count.
#[derive(Debug, Clone, PartialEq)]
pub struct GardenState {
    memories: Vec<Memory>,
    current_screen: Screen,
    completed_count: usize,
}

impl GardenState {
    /// Fresh state from the canonical memory list.
    pub fn from_canonical(canonical: Vec<Memory>) -> Self {
        Self::from_parts(canonical, Screen::default())
    }

    /// Merge `saved` onto the canonical list.
    ///
    /// Each canonical memory takes its flags from the saved record with the
    /// same id, or keeps its defaults when there is none. Saved records for
    /// ids no longer configured are dropped. The completed count is always
    /// recomputed.
    pub fn merge(canonical: Vec<Memory>, saved: &SavedState) -> Self {
        let memories = canonical
            .into_iter()
            .map(|mut memory| {
                if let Some(record) = saved.find(memory.id) {
                    memory.completed = record.completed;
                    // A completed memory was necessarily reachable.
                    memory.unlocked = record.unlocked || record.completed;
                }
                memory
            })
            .collect();

        let screen = Screen::parse_or_default(saved.current_screen.as_deref());
        Self::from_parts(memories, screen)
    }

    fn from_parts(memories: Vec<Memory>, current_screen: Screen) -> Self {
        let completed_count = memories.iter().filter(|m| m.completed).count();
        Self {
            memories,
            current_screen,
            completed_count,
        }
    }

    pub fn memories(&self) -> &[Memory] {
        &self.memories
    }

    pub fn memory(&self, id: MemoryId) -> Option<&Memory> {
        self.memories.iter().find(|m| m.id == id)
    }

    pub fn current_screen(&self) -> Screen {
        self.current_screen
    }

    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    pub fn total(&self) -> usize {
        self.memories.len()
    }

    pub fn is_complete(&self) -> bool {
        !self.memories.is_empty() && self.completed_count == self.memories.len()
    }

    /// Mark `id` completed.
    pub(crate) fn complete(&mut self, id: MemoryId) -> Completion {
        let Some(memory) = self.memories.iter_mut().find(|m| m.id == id) else {
            return Completion::Unknown;
        };
        if memory.completed {
            return Completion::AlreadyCompleted;
        }
        if !memory.unlocked {
            return Completion::Locked;
        }
        memory.completed = true;
        self.completed_count += 1;
        Completion::Completed
    }

    /// Unlock each of `ids` that exists. Returns the ids that changed.
    pub(crate) fn unlock_all(&mut self, ids: &[MemoryId]) -> Vec<MemoryId> {
        let mut newly_unlocked = Vec::new();
        for id in ids {
            if let Some(memory) = self.memories.iter_mut().find(|m| m.id == *id) {
                if !memory.unlocked {
                    memory.unlocked = true;
                    newly_unlocked.push(*id);
                }
            }
        }
        newly_unlocked
    }

    pub(crate) fn set_screen(&mut self, screen: Screen) {
        self.current_screen = screen;
    }

    /// Snapshot for persistence.
    pub fn to_saved(&self) -> SavedState {
        SavedState::capture(&self.memories, self.current_screen, self.completed_count)
    }
}
