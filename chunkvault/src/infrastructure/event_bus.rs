// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Process Event Bus
//!
//! Typed publish/subscribe fan-out over [`StorageEvent`]. Handlers register
//! per [`EventKind`] during startup wiring; the bus is immutable afterwards
//! and shared behind an `Arc`.
//!
//! Delivery is best-effort with handler isolation: each handler is invoked
//! independently, and a handler error is caught and logged with the event's
//! correlation ID without suppressing the remaining handlers. No ordering is
//! guaranteed among the handlers of one publish.

use async_trait::async_trait;
use chunkvault_domain::{DomainEvent, EngineError, EventKind, StorageEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Handler for one or more event kinds.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handler name used in isolation logs
    fn name(&self) -> &str;

    /// Reacts to a published event
    async fn handle(&self, event: &StorageEvent) -> Result<(), EngineError>;
}

/// Map from event kind to its registered handler list.
///
/// Registration happens behind a lock so handlers that publish follow-up
/// events can hold an `Arc` to the bus they are registered on; after startup
/// wiring the map is read-mostly.
#[derive(Default)]
pub struct EventBus {
    handlers: std::sync::RwLock<HashMap<EventKind, Vec<Arc<dyn EventHandler>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one event kind. Startup-time only.
    pub fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().expect("event bus lock poisoned");
        handlers.entry(kind).or_default().push(handler);
    }

    /// Number of handlers registered for a kind
    pub fn handler_count(&self, kind: EventKind) -> usize {
        let handlers = self.handlers.read().expect("event bus lock poisoned");
        handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Publishes an event to every handler registered for its kind.
    ///
    /// Handler failures are logged and swallowed here (and only here):
    /// isolation between handlers is part of the bus contract.
    pub async fn publish(&self, event: &StorageEvent) {
        let kind = event.kind();
        // Snapshot outside the lock; handlers run without holding it.
        let handlers: Vec<Arc<dyn EventHandler>> = {
            let map = self.handlers.read().expect("event bus lock poisoned");
            map.get(&kind).cloned().unwrap_or_default()
        };
        if handlers.is_empty() {
            debug!(
                correlation_id = %event.correlation_id(),
                event = kind.as_str(),
                "no handlers registered"
            );
            return;
        }

        for handler in &handlers {
            if let Err(err) = handler.handle(event).await {
                error!(
                    correlation_id = %event.correlation_id(),
                    event = kind.as_str(),
                    handler = handler.name(),
                    error = %err,
                    "event handler failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkvault_domain::{ChunkStoredEvent, CorrelationId, FileId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        name: String,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        fn name(&self) -> &str {
            &self.name
        }

        async fn handle(&self, _event: &StorageEvent) -> Result<(), EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(EngineError::internal("handler exploded"))
            } else {
                Ok(())
            }
        }
    }

    fn chunk_stored() -> StorageEvent {
        let file_id = FileId::generate();
        StorageEvent::ChunkStored(ChunkStoredEvent::new(
            format!("{}_0", file_id),
            &file_id,
            0,
            "fs".into(),
            100,
            CorrelationId::generate(),
        ))
    }

    #[tokio::test]
    async fn test_all_handlers_receive_the_event() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for i in 0..3 {
            bus.subscribe(
                EventKind::ChunkStored,
                Arc::new(CountingHandler {
                    name: format!("h{}", i),
                    calls: calls.clone(),
                    fail: false,
                }),
            );
        }

        bus.publish(&chunk_stored()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_suppress_others() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        bus.subscribe(
            EventKind::ChunkStored,
            Arc::new(CountingHandler {
                name: "boom".into(),
                calls: calls.clone(),
                fail: true,
            }),
        );
        bus.subscribe(
            EventKind::ChunkStored,
            Arc::new(CountingHandler {
                name: "steady".into(),
                calls: calls.clone(),
                fail: false,
            }),
        );

        bus.publish(&chunk_stored()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_publish_without_handlers_is_a_no_op() {
        let bus = EventBus::new();
        bus.publish(&chunk_stored()).await;
        assert_eq!(bus.handler_count(EventKind::ChunkStored), 0);
    }
}
