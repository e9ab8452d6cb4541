//! Engine event bus
//!
//! Fan-out notifier for step renderers and observers. Events are delivered
//! synchronously in registration order before the triggering engine call
//! returns. Each listener runs inside its own unwind boundary: a panicking
//! listener is logged and skipped, and can neither block later listeners
//! nor corrupt engine state.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tracing::warn;

use crate::engine::state::StepRecord;
use crate::workflow::Node;

/// Notification delivered to registered listeners
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The engine moved onto a node (after start, a transition, or undo)
    StepEntered { node_id: String, node: Node },

    /// A step finished and its result was recorded
    StepCompleted { node_id: String, result: StepRecord },

    /// A condition node was entered and evaluated; the renderer picks the
    /// branch output to complete with
    ConditionEvaluated { node_id: String, result: bool },

    /// The graph was exhausted; carries the final collected data
    WorkflowCompleted { collected_data: Map<String, Value> },

    /// The run failed (no start node)
    WorkflowError { message: String },

    /// A completed step had no route for the attempted output
    NoNextStep { node_id: String, output_id: String },
}

/// Handle returned by [`EventBus::on`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&EngineEvent) + Send + Sync + 'static>;

#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; returns the id to pass to [`EventBus::off`]
    pub fn on<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().expect("listener registry poisoned");
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Deliver an event to every listener in registration order.
    ///
    /// The registry lock is released before dispatch so listeners may
    /// subscribe, unsubscribe, or call back into the engine.
    pub fn emit(&self, event: &EngineEvent) {
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .expect("listener registry poisoned")
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                warn!(?event, "event listener panicked; continuing delivery");
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.listeners.lock().map(|l| l.len()).unwrap_or(0);
        f.debug_struct("EventBus").field("listeners", &count).finish()
    }
}
