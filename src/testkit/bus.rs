//! In-process event bus.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::warn;

use crate::port::{EventBus, EventHandler};

/// Delivers each publish synchronously to every subscriber of the event, in
/// subscription order. A panicking handler is logged and skipped.
#[derive(Default)]
pub struct InMemoryEventBus {
    handlers: RwLock<HashMap<String, Vec<EventHandler>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        self.handlers.write().clear();
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.handlers.read().get(event).map_or(0, Vec::len)
    }
}

impl EventBus for InMemoryEventBus {
    fn subscribe(&self, event: &str, handler: EventHandler) {
        self.handlers
            .write()
            .entry(event.to_string())
            .or_default()
            .push(handler);
    }

    fn publish(&self, event: &str, payload: &Value) {
        // Snapshot so handlers may subscribe without deadlocking.
        let handlers = match self.handlers.read().get(event) {
            Some(handlers) => handlers.clone(),
            None => return,
        };
        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(payload))).is_err() {
                warn!(event, "Event handler panicked");
            }
        }
    }
}

impl std::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("events", &self.handlers.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn panicking_handler_does_not_block_others() {
        let bus = InMemoryEventBus::new();
        let hits = Arc::new(AtomicU32::new(0));
        bus.subscribe("Retry", Arc::new(|_| panic!("handler failure")));
        let counter = Arc::clone(&hits);
        bus.subscribe(
            "Retry",
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bus.publish("Retry", &Value::Null);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_removes_subscribers() {
        let bus = InMemoryEventBus::new();
        bus.subscribe("Retry", Arc::new(|_| {}));
        assert_eq!(bus.listener_count("Retry"), 1);
        bus.clear();
        assert_eq!(bus.listener_count("Retry"), 0);
    }
}
