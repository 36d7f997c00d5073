//! Memory garden state machine.
//!
//! This crate provides:
//! - Memories that unlock one after another as each is completed
//! - Derived progress with threshold-based subtitles
//! - Debounced persistence that survives configuration changes
//! - Synchronous, ordered event notifications for a presentation layer
//!
//! # Quick Start
//!
//! ```ignore
//! use garden_core::{Garden, MemoryStore, MemoryId, testing::sample_config};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let mut garden = Garden::initialize(sample_config(4), store).await?;
//!
//!     garden.mark_memory_complete(MemoryId::new(1));
//!     println!("{:.0}% - {}", garden.progress_percentage(), garden.progress_subtitle());
//!
//!     garden.flush().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod debounce;
pub mod events;
pub mod garden;
pub mod memory;
pub mod persist;
pub mod progress;
pub mod screen;
pub mod state;
pub mod testing;
pub mod unlock;

// Primary public API
pub use config::{ConfigError, GardenConfig, Settings};
pub use events::{EventKind, GardenEvent, StateChange, SubscriptionId};
pub use garden::{Garden, GardenError};
pub use memory::{MediaType, Memory, MemoryId, PinState, Position, SpecialType};
pub use persist::{FileStore, MemoryStore, PersistError, SavedState, StateStore};
pub use progress::{Progress, SubtitleThresholds};
pub use screen::Screen;
pub use state::GardenState;
pub use testing::TestHarness;
pub use unlock::UnlockGraph;
