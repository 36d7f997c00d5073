//! Testing utilities for gardens.
//!
//! This module provides tools for integration testing:
//! - `sample_memories` / `sample_config` for quick garden setups
//! - `TestHarness` wrapping a garden on an in-process store, recording every
//!   event it emits

use crate::config::GardenConfig;
use crate::events::{EventKind, GardenEvent};
use crate::garden::{Garden, GardenError};
use crate::memory::{MediaType, Memory, MemoryId};
use crate::persist::{MemoryStore, StateStore};
use std::sync::{Arc, Mutex};

/// `n` memories with ids `1..=n`; the first is unlocked and the last is the
/// proposal trigger.
pub fn sample_memories(n: u32) -> Vec<Memory> {
    (1..=n)
        .map(|id| {
            let mut memory = Memory::new(id, format!("Memory {id}"))
                .with_media(
                    MediaType::Images,
                    vec![format!("assets/memories/memory_{id}/photo1.jpg")],
                )
                .with_caption("Describe this memory...")
                .at(39.8344 + f64::from(id) * 0.0001, -77.2337);
            if id == 1 {
                memory = memory.unlocked();
            }
            if id == n && n > 1 {
                memory = memory.proposal();
            }
            memory
        })
        .collect()
}

/// Sequential garden of `n` sample memories with default settings.
pub fn sample_config(n: u32) -> GardenConfig {
    GardenConfig::new(sample_memories(n))
}

/// A garden on an in-process store, with every event recorded.
pub struct TestHarness {
    /// The garden under test.
    pub garden: Garden,
    /// The store behind it.
    pub store: Arc<MemoryStore>,
    events: Arc<Mutex<Vec<GardenEvent>>>,
}

impl TestHarness {
    /// Harness over a sequential garden of `n` sample memories.
    pub async fn new(n: u32) -> Result<Self, GardenError> {
        Self::with_config(sample_config(n)).await
    }

    /// Harness over `config` with an empty store.
    pub async fn with_config(config: GardenConfig) -> Result<Self, GardenError> {
        Self::with_store(config, Arc::new(MemoryStore::new())).await
    }

    /// Harness over `config` with an existing store, e.g. to simulate a
    /// returning viewer.
    pub async fn with_store(
        config: GardenConfig,
        store: Arc<MemoryStore>,
    ) -> Result<Self, GardenError> {
        let dyn_store: Arc<dyn StateStore> = store.clone();
        let mut garden = Garden::initialize(config, dyn_store).await?;

        let events = Arc::new(Mutex::new(Vec::new()));
        for kind in EventKind::ALL {
            let events = Arc::clone(&events);
            garden.subscribe(kind, move |event| {
                events
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(event.clone())
            });
        }

        Ok(Self {
            garden,
            store,
            events,
        })
    }

    /// Complete memory `id`.
    pub fn complete(&mut self, id: u32) -> bool {
        self.garden.mark_memory_complete(MemoryId::new(id))
    }

    /// Complete memories in order, stopping at the first failure.
    pub fn complete_all(&mut self, ids: impl IntoIterator<Item = u32>) -> bool {
        ids.into_iter().all(|id| self.complete(id))
    }

    /// Every event recorded so far.
    pub fn events(&self) -> Vec<GardenEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Kinds of the recorded events, in order.
    pub fn event_kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(GardenEvent::kind).collect()
    }

    /// How many events of `kind` were recorded.
    pub fn count(&self, kind: EventKind) -> usize {
        self.events().iter().filter(|e| e.kind() == kind).count()
    }

    /// Forget recorded events.
    pub fn clear_events(&self) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// `(unlocked, completed)` of memory `id`.
    pub fn flags(&self, id: u32) -> Option<(bool, bool)> {
        self.garden
            .memory(MemoryId::new(id))
            .map(|m| (m.unlocked, m.completed))
    }

    /// Ids of unlocked memories.
    pub fn unlocked_ids(&self) -> Vec<u32> {
        self.garden
            .unlocked_memories()
            .iter()
            .map(|m| m.id.get())
            .collect()
    }

    /// Raw stored value under the garden's storage key.
    pub fn stored(&self) -> Option<String> {
        self.store.get(&self.garden.config().settings.storage_key)
    }
}
