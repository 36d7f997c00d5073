//! Garden - the unlock/progress state machine.
//!
//! This is the primary public API. It owns the memories and their flags, the
//! unlock graph, the event registry and the debounced writer, and it is the
//! only thing that mutates any of them.
//!
//! # Example
//!
//! ```ignore
//! use garden_core::{EventKind, FileStore, Garden, GardenConfig, MemoryId};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GardenConfig::load("garden.json").await?;
//!     let store = Arc::new(FileStore::new("saves"));
//!     let mut garden = Garden::initialize(config, store).await?;
//!
//!     garden.subscribe(EventKind::AllComplete, |_| println!("All roses bloomed"));
//!
//!     garden.mark_memory_complete(MemoryId::new(1));
//!     println!("{}", garden.progress_subtitle());
//!
//!     garden.flush().await;
//!     Ok(())
//! }
//! ```

use crate::config::{ConfigError, GardenConfig};
use crate::debounce::SaveScheduler;
use crate::events::{EventBus, EventKind, GardenEvent, StateChange, SubscriptionId};
use crate::memory::{Memory, MemoryId};
use crate::persist::{SavedState, StateStore};
use crate::progress::{self, Progress, SubtitleThresholds};
use crate::screen::Screen;
use crate::state::{Completion, GardenState};
use crate::unlock::UnlockGraph;
use std::sync::Arc;
use thiserror::Error;

/// Errors from constructing a garden.
#[derive(Debug, Error)]
pub enum GardenError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// The memory garden state machine.
pub struct Garden {
    config: GardenConfig,
    graph: UnlockGraph,
    state: GardenState,
    events: EventBus,
    saver: SaveScheduler,
}

impl Garden {
    /// Build a garden from `config`, restoring progress from `store`.
    ///
    /// Saved progress is merged onto the configured memories by id. A missing,
    /// unreadable or malformed saved state is logged and the garden starts
    /// from its defaults. Only an invalid configuration is an error.
    pub async fn initialize(
        config: GardenConfig,
        store: Arc<dyn StateStore>,
    ) -> Result<Self, GardenError> {
        config.validate()?;

        let key = config.settings.storage_key.clone();
        let saver = SaveScheduler::new(store, key, config.settings.auto_save_delay());
        let state = load_state(&config, &saver).await;
        let graph = config.unlock_graph();

        tracing::debug!(
            memories = state.total(),
            completed = state.completed_count(),
            screen = %state.current_screen(),
            "Garden initialized"
        );

        Ok(Self {
            config,
            graph,
            state,
            events: EventBus::new(),
            saver,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All memories in configured order.
    pub fn memories(&self) -> &[Memory] {
        self.state.memories()
    }

    /// A memory by id.
    pub fn memory(&self, id: MemoryId) -> Option<&Memory> {
        self.state.memory(id)
    }

    /// Memories that can be opened, including completed ones.
    pub fn unlocked_memories(&self) -> Vec<&Memory> {
        self.memories().iter().filter(|m| m.unlocked).collect()
    }

    pub fn completed_memories(&self) -> Vec<&Memory> {
        self.memories().iter().filter(|m| m.completed).collect()
    }

    /// The full current state.
    pub fn state(&self) -> &GardenState {
        &self.state
    }

    pub fn config(&self) -> &GardenConfig {
        &self.config
    }

    pub fn unlock_graph(&self) -> &UnlockGraph {
        &self.graph
    }

    /// Number of completed memories.
    pub fn progress(&self) -> usize {
        self.state.completed_count()
    }

    /// Completed share as a percentage in `0.0..=100.0`.
    pub fn progress_percentage(&self) -> f64 {
        progress::percentage(self.state.completed_count(), self.state.total())
    }

    /// Subtitle for the current completed count.
    pub fn progress_subtitle(&self) -> &str {
        self.subtitles().select(self.state.completed_count())
    }

    /// Count, total, percentage and subtitle together.
    pub fn progress_snapshot(&self) -> Progress {
        Progress {
            count: self.progress(),
            total: self.state.total(),
            percentage: self.progress_percentage(),
            subtitle: self.progress_subtitle().to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    pub fn current_screen(&self) -> Screen {
        self.state.current_screen()
    }

    fn subtitles(&self) -> &SubtitleThresholds {
        &self.config.progress_subtitles
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Complete a memory and unlock its successors.
    ///
    /// Returns false, changing nothing and notifying no one, when `id` is
    /// unknown, already completed or still locked. A locked memory is refused
    /// here rather than left to the map to guard, so a completed memory is
    /// always unlocked.
    pub fn mark_memory_complete(&mut self, id: MemoryId) -> bool {
        match self.state.complete(id) {
            Completion::Completed => {}
            Completion::Unknown => {
                tracing::debug!(%id, "Ignoring completion of unknown memory");
                return false;
            }
            Completion::AlreadyCompleted => return false,
            Completion::Locked => {
                tracing::debug!(%id, "Ignoring completion of locked memory");
                return false;
            }
        }

        let unlocked = self.state.unlock_all(self.graph.successors(id));
        tracing::debug!(%id, ?unlocked, completed = self.progress(), "Memory completed");

        self.schedule_save();

        if let Some(memory) = self.state.memory(id).cloned() {
            self.events.emit(&GardenEvent::MemoryCompleted { id, memory });
        }
        let progress = self.progress_snapshot();
        self.events.emit(&GardenEvent::ProgressUpdated(progress));

        if self.state.completed_count() == self.state.total() {
            tracing::info!(total = self.state.total(), "Every memory completed");
            self.events.emit(&GardenEvent::AllComplete);
        }

        true
    }

    /// Record the screen the viewer is on.
    pub fn set_screen(&mut self, screen: Screen) {
        self.state.set_screen(screen);
        self.schedule_save();
        self.events.emit(&GardenEvent::StateChanged(StateChange {
            reset: false,
            screen: Some(screen),
        }));
    }

    /// Forget all progress.
    ///
    /// Cancels any pending save, clears the stored state and returns every
    /// memory to its configured defaults.
    pub async fn reset(&mut self) {
        // Waits out a write already in flight so it cannot land after the remove.
        self.saver.cancel().await;

        let key = self.saver.key().to_string();
        if let Err(e) = self.saver.store().remove(&key).await {
            tracing::warn!(key = %key, error = %e, "Could not clear saved garden state");
        }

        self.state = GardenState::from_canonical(self.config.canonical_memories());
        tracing::info!("Garden reset");

        self.events.emit(&GardenEvent::StateChanged(StateChange {
            reset: true,
            screen: None,
        }));
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Write any pending save now. Returns whether there was one.
    pub async fn flush(&mut self) -> bool {
        self.saver.flush().await
    }

    pub fn has_pending_save(&self) -> bool {
        self.saver.is_pending()
    }

    fn schedule_save(&mut self) {
        self.saver.schedule(self.state.to_saved());
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Call `listener` for every event of `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&GardenEvent) + Send + 'static,
    {
        self.events.subscribe(kind, listener)
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.events.listener_count(kind)
    }
}

impl std::fmt::Debug for Garden {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Garden")
            .field("state", &self.state)
            .field("events", &self.events)
            .field("saver", &self.saver)
            .finish()
    }
}

/// Read saved state, falling back to the canonical defaults on any failure.
async fn load_state(config: &GardenConfig, saver: &SaveScheduler) -> GardenState {
    let canonical = config.canonical_memories();
    let key = saver.key();

    let text = match saver.store().load(key).await {
        Ok(Some(text)) => text,
        Ok(None) => return GardenState::from_canonical(canonical),
        Err(e) => {
            tracing::warn!(key, error = %e, "Could not load saved garden state");
            return GardenState::from_canonical(canonical);
        }
    };

    match SavedState::from_json(&text) {
        Ok(saved) => GardenState::merge(canonical, &saved),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring malformed saved garden state");
            GardenState::from_canonical(canonical)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use crate::progress::SubtitleThresholds;
    use std::sync::Mutex;
    use std::time::Duration;

    fn config(n: u32) -> GardenConfig {
        let memories = (1..=n)
            .map(|id| {
                let memory = Memory::new(id, format!("Memory {id}"));
                if id == 1 {
                    memory.unlocked()
                } else {
                    memory
                }
            })
            .collect();
        GardenConfig::new(memories)
    }

    async fn garden(n: u32) -> (Garden, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let garden = Garden::initialize(config(n), store.clone()).await.unwrap();
        (garden, store)
    }

    fn record(garden: &mut Garden) -> Arc<Mutex<Vec<GardenEvent>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for kind in EventKind::ALL {
            let log = Arc::clone(&log);
            garden.subscribe(kind, move |event| log.lock().unwrap().push(event.clone()));
        }
        log
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_unlock() {
        let (mut garden, _) = garden(3).await;
        let id = MemoryId::new;

        assert!(garden.mark_memory_complete(id(1)));
        assert!(garden.memory(id(2)).unwrap().unlocked);
        assert!(!garden.memory(id(3)).unwrap().unlocked);

        assert!(garden.mark_memory_complete(id(2)));
        assert!(garden.memory(id(3)).unwrap().unlocked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_in_order() {
        let (mut garden, _) = garden(2).await;
        let log = record(&mut garden);

        garden.mark_memory_complete(MemoryId::new(1));
        garden.mark_memory_complete(MemoryId::new(2));

        let kinds: Vec<_> = log.lock().unwrap().iter().map(GardenEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::MemoryCompleted,
                EventKind::ProgressUpdated,
                EventKind::MemoryCompleted,
                EventKind::ProgressUpdated,
                EventKind::AllComplete,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_event_payload() {
        let (mut garden, _) = garden(4).await;
        let log = record(&mut garden);

        garden.mark_memory_complete(MemoryId::new(1));

        let events = log.lock().unwrap();
        let GardenEvent::ProgressUpdated(progress) = &events[1] else {
            panic!("expected progress event, got {:?}", events[1]);
        };
        assert_eq!(progress.count, 1);
        assert_eq!(progress.total, 4);
        assert_eq!(progress.percentage, 25.0);
        assert_eq!(progress.subtitle, "The first rose begins to bloom...");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_completions_are_silent() {
        let (mut garden, _) = garden(3).await;
        let log = record(&mut garden);

        assert!(!garden.mark_memory_complete(MemoryId::new(42)));
        assert!(!garden.mark_memory_complete(MemoryId::new(3)));
        assert!(garden.mark_memory_complete(MemoryId::new(1)));
        let after_first = log.lock().unwrap().len();
        assert!(!garden.mark_memory_complete(MemoryId::new(1)));

        assert_eq!(log.lock().unwrap().len(), after_first);
        assert_eq!(garden.listener_count(EventKind::ProgressUpdated), 1);
        assert_eq!(garden.progress(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subtitle_selection() {
        let store = Arc::new(MemoryStore::new());
        let config = config(10).with_subtitles(SubtitleThresholds::from_pairs([
            (0, "A"),
            (3, "B"),
            (5, "C"),
        ]));
        let mut garden = Garden::initialize(config, store).await.unwrap();

        assert_eq!(garden.progress_subtitle(), "A");
        for id in 1..=4 {
            garden.mark_memory_complete(MemoryId::new(id));
        }
        assert_eq!(garden.progress_subtitle(), "B");
        for id in 5..=10 {
            garden.mark_memory_complete(MemoryId::new(id));
        }
        assert_eq!(garden.progress(), 10);
        assert_eq!(garden.progress_subtitle(), "C");
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_screen_emits_and_saves() {
        let (mut garden, store) = garden(2).await;
        let log = record(&mut garden);

        garden.set_screen(Screen::Map);
        assert_eq!(garden.current_screen(), Screen::Map);
        assert_eq!(
            log.lock().unwrap().as_slice(),
            &[GardenEvent::StateChanged(StateChange {
                reset: false,
                screen: Some(Screen::Map)
            })]
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_config_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let result = Garden::initialize(GardenConfig::new(vec![]), store).await;
        assert!(matches!(result, Err(GardenError::Config(ConfigError::NoMemories))));
    }
}
