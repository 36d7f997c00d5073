//! Notifications from the garden to the presentation layer.
//!
//! Listeners are registered per [`EventKind`] and called synchronously, in
//! registration order, before the triggering operation returns.

use crate::memory::{Memory, MemoryId};
use crate::progress::Progress;
use crate::screen::Screen;
use std::collections::HashMap;
use std::fmt;

/// The kinds of event a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MemoryCompleted,
    ProgressUpdated,
    StateChanged,
    AllComplete,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::MemoryCompleted,
        EventKind::ProgressUpdated,
        EventKind::StateChanged,
        EventKind::AllComplete,
    ];

    /// Wire-style name, e.g. `memory:complete`.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::MemoryCompleted => "memory:complete",
            EventKind::ProgressUpdated => "progress:update",
            EventKind::StateChanged => "state:change",
            EventKind::AllComplete => "all:complete",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload of a state-changed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    /// True when the whole garden was reset.
    pub reset: bool,
    /// The new screen, when the change was a navigation.
    pub screen: Option<Screen>,
}

/// An event emitted by the garden.
#[derive(Debug, Clone, PartialEq)]
pub enum GardenEvent {
    /// A memory was just completed.
    MemoryCompleted { id: MemoryId, memory: Memory },
    /// Progress metrics after a completion.
    ProgressUpdated(Progress),
    /// Reset or screen change.
    StateChanged(StateChange),
    /// Every memory is now completed.
    AllComplete,
}

impl GardenEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GardenEvent::MemoryCompleted { .. } => EventKind::MemoryCompleted,
            GardenEvent::ProgressUpdated(_) => EventKind::ProgressUpdated,
            GardenEvent::StateChanged(_) => EventKind::StateChanged,
            GardenEvent::AllComplete => EventKind::AllComplete,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// A registered event callback.
pub type Listener = Box<dyn FnMut(&GardenEvent) + Send>;

/// Publish/subscribe registry keyed by event kind.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<EventKind, Vec<(SubscriptionId, Listener)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for events of `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&GardenEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for listeners in self.listeners.values_mut() {
            if let Some(pos) = listeners.iter().position(|(sub, _)| *sub == id) {
                listeners.remove(pos);
                return true;
            }
        }
        false
    }

    /// Deliver `event` to every listener of its kind, in registration order.
    pub fn emit(&mut self, event: &GardenEvent) {
        let kind = event.kind();
        let Some(listeners) = self.listeners.get_mut(&kind) else {
            return;
        };
        tracing::trace!(event = %kind, listeners = listeners.len(), "Emitting event");
        for (_, listener) in listeners.iter_mut() {
            listener(event);
        }
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map(Vec::len).unwrap_or(0)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self
            .listeners
            .iter()
            .map(|(kind, listeners)| (kind.name(), listeners.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> impl FnMut(&GardenEvent) + Send + 'static {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        move |event: &GardenEvent| log.lock().unwrap().push(format!("{tag}:{}", event.kind()))
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::AllComplete, recorder(&log, "first"));
        bus.subscribe(EventKind::AllComplete, recorder(&log, "second"));
        bus.subscribe(EventKind::AllComplete, recorder(&log, "third"));

        bus.emit(&GardenEvent::AllComplete);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:all:complete", "second:all:complete", "third:all:complete"]
        );
    }

    #[test]
    fn test_only_matching_kind_is_notified() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::StateChanged, recorder(&log, "state"));

        bus.emit(&GardenEvent::AllComplete);
        assert!(log.lock().unwrap().is_empty());

        bus.emit(&GardenEvent::StateChanged(StateChange {
            reset: true,
            screen: None,
        }));
        assert_eq!(*log.lock().unwrap(), vec!["state:state:change"]);
    }

    #[test]
    fn test_unsubscribe() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        let first = bus.subscribe(EventKind::AllComplete, recorder(&log, "first"));
        bus.subscribe(EventKind::AllComplete, recorder(&log, "second"));

        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        assert_eq!(bus.listener_count(EventKind::AllComplete), 1);

        bus.emit(&GardenEvent::AllComplete);
        assert_eq!(*log.lock().unwrap(), vec!["second:all:complete"]);
    }

    #[test]
    fn test_subscription_ids_are_unique_across_kinds() {
        let mut bus = EventBus::new();
        let a = bus.subscribe(EventKind::AllComplete, |_| {});
        let b = bus.subscribe(EventKind::StateChanged, |_| {});
        assert_ne!(a, b);
    }

    #[test]
    fn test_event_kind_names() {
        let names: Vec<_> = EventKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(
            names,
            vec!["memory:complete", "progress:update", "state:change", "all:complete"]
        );
    }
}
