//! Synchronous in-process fan-out of engine events.
//!
//! Observers run in subscription order, once per publish. A panicking
//! observer is caught and logged; the remaining observers still run.

use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use crate::document::Memory;

/// Events the engine emits. [`EngineEvent::name`] is the wire name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum EngineEvent {
    StateSaved,
    QuantumUnlockSuccess,
    QuantumLockout,
    MemoryAdded(Memory),
    MetricsUpdated,
    PredictionsUpdated,
    AiThinking,
    AiResponse(String),
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::StateSaved => "state_saved",
            EngineEvent::QuantumUnlockSuccess => "quantum_unlock_success",
            EngineEvent::QuantumLockout => "quantum_lockout",
            EngineEvent::MemoryAdded(_) => "memory_added",
            EngineEvent::MetricsUpdated => "metrics_updated",
            EngineEvent::PredictionsUpdated => "predictions_updated",
            EngineEvent::AiThinking => "ai_thinking",
            EngineEvent::AiResponse(_) => "ai_response",
        }
    }
}

/// Anything that wants engine events. Closures taking `&EngineEvent` qualify.
pub trait Observer: Send {
    fn notify(&self, event: &EngineEvent);
}

impl<F> Observer for F
where
    F: Fn(&EngineEvent) + Send,
{
    fn notify(&self, event: &EngineEvent) {
        self(event)
    }
}

/// Handle returned by [`NotificationBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct NotificationBus {
    observers: Vec<(SubscriptionId, Box<dyn Observer>)>,
    next_id: u64,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl Observer + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn publish(&self, event: &EngineEvent) {
        tracing::trace!(event = event.name(), observers = self.observers.len(), "publish");
        for (id, observer) in &self.observers {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer.notify(event)));
            if outcome.is_err() {
                tracing::error!(
                    event = event.name(),
                    subscription = id.0,
                    "observer panicked; continuing with remaining observers"
                );
            }
        }
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}
