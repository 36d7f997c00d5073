//! Debounced saving.
//!
//! Every mutation hands the scheduler a fresh snapshot. The scheduler signals
//! whatever write is still waiting and starts a new delayed one, so a burst of
//! mutations ends in a single write of the last snapshot.
//!
//! A pending write can only be called off while it sleeps. Once it has started
//! writing it runs to completion, and every later write, cancel or flush waits
//! for it first, so writes to one key never overlap.

use crate::persist::{SavedState, StateStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A pending write: the task, its cancel signal and the snapshot it will write.
///
/// The task resolves to `true` if it wrote, `false` if it was called off.
struct PendingSave {
    task: JoinHandle<bool>,
    cancel: oneshot::Sender<()>,
    snapshot: SavedState,
}

impl PendingSave {
    /// Call the write off if it is still sleeping and wait for the task to end.
    ///
    /// Returns whether the write had already happened.
    async fn stop(self) -> bool {
        let _ = self.cancel.send(());
        match self.task.await {
            Ok(wrote) => wrote,
            Err(e) => {
                tracing::error!(error = %e, "Save task failed");
                false
            }
        }
    }
}

/// Cancellable delayed writer for one storage key.
pub struct SaveScheduler {
    store: Arc<dyn StateStore>,
    key: String,
    delay: Duration,
    runtime: Handle,
    pending: Option<PendingSave>,
}

impl SaveScheduler {
    /// Create a scheduler bound to the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(store: Arc<dyn StateStore>, key: impl Into<String>, delay: Duration) -> Self {
        Self::with_runtime(store, key, delay, Handle::current())
    }

    pub fn with_runtime(
        store: Arc<dyn StateStore>,
        key: impl Into<String>,
        delay: Duration,
        runtime: Handle,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            delay,
            runtime,
            pending: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Replace any pending write with a delayed write of `snapshot`.
    ///
    /// The new write starts its delay only after the previous task has ended.
    pub fn schedule(&mut self, snapshot: SavedState) {
        let previous = self.pending.take().map(|pending| {
            let _ = pending.cancel.send(());
            pending.task
        });

        let (cancel, mut cancelled) = oneshot::channel();
        let store = Arc::clone(&self.store);
        let key = self.key.clone();
        let delay = self.delay;
        let mut to_write = snapshot.clone();

        let task = self.runtime.spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }

            // A dropped sender is not a cancel: the write still happens.
            tokio::select! {
                biased;
                Ok(()) = &mut cancelled => false,
                _ = tokio::time::sleep(delay) => {
                    to_write.touch();
                    write_snapshot(store.as_ref(), &key, &to_write).await;
                    true
                }
            }
        });

        self.pending = Some(PendingSave {
            task,
            cancel,
            snapshot,
        });
    }

    /// Drop the pending write, if any, and wait out a write already under way.
    ///
    /// Returns whether a write was called off before it started.
    pub async fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => !pending.stop().await,
            None => false,
        }
    }

    /// Whether a write is scheduled and has not yet run.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|p| !p.task.is_finished())
            .unwrap_or(false)
    }

    /// Perform the pending write now instead of after the delay.
    ///
    /// Returns false when nothing was pending.
    pub async fn flush(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        let mut snapshot = pending.snapshot.clone();
        if pending.stop().await {
            return false;
        }

        snapshot.touch();
        write_snapshot(self.store.as_ref(), &self.key, &snapshot).await;
        true
    }
}

impl std::fmt::Debug for SaveScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveScheduler")
            .field("key", &self.key)
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Serialize and store `snapshot`, logging instead of failing.
async fn write_snapshot(store: &dyn StateStore, key: &str, snapshot: &SavedState) {
    let json = match snapshot.to_json() {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(key, error = %e, "Could not serialize garden state");
            return;
        }
    };

    match store.save(key, &json).await {
        Ok(()) => tracing::debug!(key, completed = snapshot.completed_count, "Saved garden state"),
        Err(e) => tracing::error!(key, error = %e, "Could not save garden state"),
    }
}
