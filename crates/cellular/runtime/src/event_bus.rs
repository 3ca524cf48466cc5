//! Event bus for cellular components
//!
//! Every cell, tissue, organ and the manager own one bus. A bus delivers an
//! event to its registered handlers and broadcast subscribers, then relays
//! it unchanged upward:
//!
//! - to its **parent** (the group the component belongs to), and
//! - to its **root** (the manager) only when the parent chain did not
//!   already reach a root bus.
//!
//! This gives a Cell → Tissue → Organ → Manager relay in which the manager
//! sees each event exactly once.

use cellular_types::{CellularEvent, EventType};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Callback type for event handlers
pub type EventHandler = Arc<dyn Fn(&CellularEvent) + Send + Sync>;

struct RegisteredHandler {
    /// `None` matches every event
    filter: Option<EventType>,
    handler: EventHandler,
}

/// Event bus for publishing and subscribing to component events
pub struct EventBus {
    /// Broadcast channel for async subscribers
    sender: broadcast::Sender<CellularEvent>,
    /// Explicitly registered callbacks
    handlers: RwLock<Vec<RegisteredHandler>>,
    /// Group this component belongs to
    parent: RwLock<Option<Arc<EventBus>>>,
    /// Manager this component is registered with
    root: RwLock<Option<Arc<EventBus>>>,
    /// Whether this is a manager bus
    is_root: bool,
    /// Event counters by type
    event_counts: DashMap<EventType, u64>,
}

impl EventBus {
    /// Create a component bus
    pub fn new(capacity: usize) -> Self {
        Self::build(capacity, false)
    }

    /// Create a manager bus; relaying stops here
    pub fn root(capacity: usize) -> Self {
        Self::build(capacity, true)
    }

    fn build(capacity: usize, is_root: bool) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            handlers: RwLock::new(Vec::new()),
            parent: RwLock::new(None),
            root: RwLock::new(None),
            is_root,
            event_counts: DashMap::new(),
        }
    }

    /// Publish an event.
    ///
    /// Returns whether the event reached a root bus.
    pub fn publish(&self, event: CellularEvent) -> bool {
        *self.event_counts.entry(event.event_type()).or_insert(0) += 1;

        // Handlers run without the lock held so they may touch the bus
        let handlers: Vec<EventHandler> = self
            .handlers
            .read()
            .iter()
            .filter(|h| h.filter.map_or(true, |t| t == event.event_type()))
            .map(|h| Arc::clone(&h.handler))
            .collect();
        for handler in handlers {
            handler(&event);
        }

        // Broadcast (ignore errors if no receivers)
        let _ = self.sender.send(event.clone());

        if self.is_root {
            return true;
        }

        let parent = self.parent.read().clone();
        let reached = match parent {
            Some(parent) => parent.publish(event.clone()),
            None => false,
        };
        if reached {
            return true;
        }

        let root = self.root.read().clone();
        match root {
            Some(root) => root.publish(event),
            None => false,
        }
    }

    /// Subscribe to events (returns a receiver)
    pub fn subscribe(&self) -> broadcast::Receiver<CellularEvent> {
        self.sender.subscribe()
    }

    /// Register a callback for one event type
    pub fn register_handler<F>(&self, event_type: EventType, handler: F)
    where
        F: Fn(&CellularEvent) + Send + Sync + 'static,
    {
        self.handlers.write().push(RegisteredHandler {
            filter: Some(event_type),
            handler: Arc::new(handler),
        });
    }

    /// Register a callback for every event
    pub fn register_handler_for_all<F>(&self, handler: F)
    where
        F: Fn(&CellularEvent) + Send + Sync + 'static,
    {
        self.handlers.write().push(RegisteredHandler {
            filter: None,
            handler: Arc::new(handler),
        });
    }

    /// Set or clear the group relay target
    pub fn set_parent(&self, parent: Option<Arc<EventBus>>) {
        *self.parent.write() = parent;
    }

    /// Clear the parent only if it is `expected`
    pub fn clear_parent_if(&self, expected: &Arc<EventBus>) {
        let mut parent = self.parent.write();
        if parent.as_ref().is_some_and(|p| Arc::ptr_eq(p, expected)) {
            *parent = None;
        }
    }

    pub fn has_parent(&self) -> bool {
        self.parent.read().is_some()
    }

    /// Set or clear the manager relay target
    pub fn set_root(&self, root: Option<Arc<EventBus>>) {
        *self.root.write() = root;
    }

    /// Number of events published on this bus for a type
    pub fn event_count(&self, event_type: EventType) -> u64 {
        self.event_counts.get(&event_type).map(|c| *c).unwrap_or(0)
    }

    /// Get statistics
    pub fn stats(&self) -> EventBusStats {
        EventBusStats {
            subscriber_count: self.sender.receiver_count(),
            handler_count: self.handlers.read().len(),
            events_by_type: self
                .event_counts
                .iter()
                .map(|r| (*r.key(), *r.value()))
                .collect(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Event bus statistics
#[derive(Clone, Debug)]
pub struct EventBusStats {
    /// Number of active subscribers
    pub subscriber_count: usize,
    /// Number of registered callbacks
    pub handler_count: usize,
    /// Events by type
    pub events_by_type: Vec<(EventType, u64)>,
}
