//! Workflow engine façade
//!
//! Composes the graph index, execution state, and event bus behind the
//! small public contract a kiosk driver uses: start, complete_step,
//! go_back, pause, resume, reset, evaluate_condition, plus read accessors
//! and event subscription.
//!
//! The engine is a pure local state machine with no I/O. Every public
//! operation is synchronous; the only asynchronous piece is the one-shot
//! timer a delay node arms, and that timer re-checks run identity before
//! acting so a stale timer from an abandoned run is a harmless no-op.
//! Wrong-state calls are silently ignored rather than errors — a stray
//! duplicate tap on a kiosk must never crash the flow.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::engine::events::{EngineEvent, EventBus, ListenerId};
use crate::engine::graph::GraphIndex;
use crate::engine::state::{ExecutionState, ExecutionStatus, StepRecord};
use crate::workflow::{condition, ConditionConfig, Node, WorkflowDefinition, DEFAULT_OUTPUT};

/// Identity captured when a delay timer is armed; the timer only fires if
/// the engine is still in the same run, on the same node, and running
struct TimerGuard {
    epoch: u64,
    node_id: String,
}

struct EngineInner {
    definition: Arc<WorkflowDefinition>,
    graph: GraphIndex,
    state: Mutex<ExecutionState>,
    bus: EventBus,
    /// Bumped on start and reset; pending timers from older epochs no-op
    epoch: AtomicU64,
}

/// Drives one run of one workflow definition.
///
/// Handles are cheap clones of a shared instance, so a delay timer task or
/// a renderer callback can hold its own handle. State is guarded by a
/// mutex with one logical writer; events are dispatched after the lock is
/// released so listeners may call back into the engine.
#[derive(Clone)]
pub struct WorkflowEngine {
    inner: Arc<EngineInner>,
}

impl WorkflowEngine {
    /// Create an engine for a definition
    pub fn new(definition: WorkflowDefinition) -> Self {
        Self::shared(Arc::new(definition))
    }

    /// Create an engine over an already-shared definition (definitions are
    /// read-only and may back many engine instances)
    pub fn shared(definition: Arc<WorkflowDefinition>) -> Self {
        let graph = GraphIndex::build(&definition);
        Self {
            inner: Arc::new(EngineInner {
                definition,
                graph,
                state: Mutex::new(ExecutionState::new()),
                bus: EventBus::new(),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Begin a run. Only valid from `Idle`; otherwise a logged no-op.
    ///
    /// Selects the entry node (root nodes preferred, trigger family first,
    /// ties broken by editor x position). An empty definition puts the
    /// engine into `Error` status with a `WorkflowError` event.
    #[instrument(skip(self), fields(workflow = %self.inner.definition.name))]
    pub fn start(&self) {
        let mut events = Vec::new();
        let mut entered = None;

        {
            let mut st = self.lock_state();
            if st.status != ExecutionStatus::Idle {
                debug!(status = ?st.status, "start ignored: engine not idle");
                return;
            }

            self.inner.epoch.fetch_add(1, Ordering::SeqCst);
            st.history.clear();
            st.collected_data = Map::new();
            st.error = None;

            match self.inner.graph.select_start_node() {
                Some(node) => {
                    info!(node_id = %node.id, run_id = %st.run_id, "workflow started");
                    st.status = ExecutionStatus::Running;
                    st.started_at = Some(Utc::now());
                    st.current_node_id = Some(node.id.clone());
                    events.push(EngineEvent::StepEntered {
                        node_id: node.id.clone(),
                        node: node.clone(),
                    });
                    entered = Some(node.clone());
                }
                None => {
                    warn!("workflow has no start node");
                    st.status = ExecutionStatus::Error;
                    st.current_node_id = None;
                    st.error = Some("no start node".to_string());
                    events.push(EngineEvent::WorkflowError {
                        message: "no start node".to_string(),
                    });
                }
            }
        }

        self.emit_all(events);
        if let Some(node) = entered {
            self.arm_auto_advance(&node);
        }
    }

    /// Complete the current step with the given output and contributed
    /// data, then transition along the graph.
    ///
    /// Returns `false` without side effects unless the engine is running
    /// with a current node. A completed step with no route left transitions
    /// the run to `Completed` (`NoNextStep` + `WorkflowCompleted` events) —
    /// that is the normal end of a workflow, not an error.
    #[instrument(skip(self, data))]
    pub fn complete_step(&self, output_id: &str, data: Map<String, Value>) -> bool {
        self.complete_internal(output_id, data, None)
    }

    /// Complete the current step with the default output and no data
    pub fn advance(&self) -> bool {
        self.complete_step(DEFAULT_OUTPUT, Map::new())
    }

    /// Undo the most recent completed step.
    ///
    /// Pops the last history record, restores that node as current, and
    /// rebuilds collected data by replaying the shorter history. Returns
    /// `false` when there is nothing to undo or the run is not in
    /// `Running`/`Paused`. The restored node is re-displayed, not
    /// re-entered: delay timers are not re-armed.
    pub fn go_back(&self) -> bool {
        let event;
        {
            let mut st = self.lock_state();
            if !matches!(st.status, ExecutionStatus::Running | ExecutionStatus::Paused) {
                debug!(status = ?st.status, "go_back ignored: run not active");
                return false;
            }
            let Some(popped) = st.pop_step() else {
                debug!("go_back ignored: empty history");
                return false;
            };

            st.current_node_id = Some(popped.node_id.clone());
            event = self
                .inner
                .graph
                .node(&popped.node_id)
                .map(|node| EngineEvent::StepEntered {
                    node_id: node.id.clone(),
                    node: node.clone(),
                });
        }

        if let Some(event) = event {
            self.inner.bus.emit(&event);
        }
        true
    }

    /// Suspend a running engine. Pending delay timers stay scheduled but
    /// will not fire while paused.
    pub fn pause(&self) {
        let mut st = self.lock_state();
        if st.status == ExecutionStatus::Running {
            st.status = ExecutionStatus::Paused;
            debug!("workflow paused");
        }
    }

    /// Resume a paused engine
    pub fn resume(&self) {
        let mut st = self.lock_state();
        if st.status == ExecutionStatus::Paused {
            st.status = ExecutionStatus::Running;
            debug!("workflow resumed");
        }
    }

    /// Abandon the current run and return to `Idle`. Safe from any status;
    /// pending delay timers become stale and will not touch the next run.
    pub fn reset(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        let mut st = self.lock_state();
        *st = ExecutionState::new();
        debug!(run_id = %st.run_id, "engine reset");
    }

    /// Evaluate a condition node's config against the current collected
    /// data. Pure and infallible: malformed configs and unknown operators
    /// evaluate to `false`.
    pub fn evaluate_condition(&self, node: &Node) -> bool {
        let Ok(config) = serde_json::from_value::<ConditionConfig>(node.config.clone()) else {
            debug!(node_id = %node.id, "condition config did not parse; evaluating false");
            return false;
        };
        let collected = self.lock_state().collected_data.clone();
        condition::evaluate(&config, &collected)
    }

    // ------------------------------------------------------------------
    // Subscription
    // ------------------------------------------------------------------

    /// Register an event listener; delivery is synchronous and in
    /// registration order
    pub fn on<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.inner.bus.on(listener)
    }

    /// Unregister a listener
    pub fn off(&self, id: ListenerId) -> bool {
        self.inner.bus.off(id)
    }

    // ------------------------------------------------------------------
    // Read accessors (snapshots only, never live references)
    // ------------------------------------------------------------------

    /// Immutable snapshot of the execution state
    pub fn state(&self) -> ExecutionState {
        self.lock_state().clone()
    }

    /// The active node, if any
    pub fn current_node(&self) -> Option<Node> {
        let current = self.lock_state().current_node_id.clone()?;
        self.node(&current)
    }

    /// Look up any node by id
    pub fn node(&self, id: &str) -> Option<Node> {
        self.inner.graph.node(id).cloned()
    }

    /// All nodes in declaration order
    pub fn nodes(&self) -> Vec<Node> {
        self.inner.graph.nodes().to_vec()
    }

    /// Snapshot of the data collected so far
    pub fn collected_data(&self) -> Map<String, Value> {
        self.lock_state().collected_data.clone()
    }

    /// The definition this engine runs
    pub fn definition(&self) -> &WorkflowDefinition {
        &self.inner.definition
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ExecutionState> {
        self.inner.state.lock().expect("execution state poisoned")
    }

    fn emit_all(&self, events: Vec<EngineEvent>) {
        for event in &events {
            self.inner.bus.emit(event);
        }
    }

    fn complete_internal(
        &self,
        output_id: &str,
        data: Map<String, Value>,
        guard: Option<TimerGuard>,
    ) -> bool {
        let mut events = Vec::new();
        let mut entered = None;

        {
            let mut st = self.lock_state();

            if let Some(guard) = &guard {
                let live = self.inner.epoch.load(Ordering::SeqCst) == guard.epoch
                    && st.current_node_id.as_deref() == Some(guard.node_id.as_str());
                if !live {
                    debug!(node_id = %guard.node_id, "stale delay timer ignored");
                    return false;
                }
            }

            if st.status != ExecutionStatus::Running {
                debug!(status = ?st.status, "complete_step ignored: engine not running");
                return false;
            }
            let Some(current_id) = st.current_node_id.clone() else {
                debug!("complete_step ignored: no current node");
                return false;
            };

            let record = StepRecord {
                node_id: current_id.clone(),
                output_id: output_id.to_string(),
                data,
                completed_at: Utc::now(),
            };
            st.record_step(record.clone());
            events.push(EngineEvent::StepCompleted {
                node_id: current_id.clone(),
                result: record,
            });

            match self.inner.graph.resolve_next(&current_id, output_id) {
                Some(next) => {
                    debug!(from = %current_id, to = %next.id, output = output_id, "step transition");
                    st.current_node_id = Some(next.id.clone());
                    events.push(EngineEvent::StepEntered {
                        node_id: next.id.clone(),
                        node: next.clone(),
                    });
                    entered = Some(next.clone());
                }
                None => {
                    info!(node_id = %current_id, steps = st.history.len(), "workflow completed");
                    st.status = ExecutionStatus::Completed;
                    st.current_node_id = None;
                    events.push(EngineEvent::NoNextStep {
                        node_id: current_id,
                        output_id: output_id.to_string(),
                    });
                    events.push(EngineEvent::WorkflowCompleted {
                        collected_data: st.collected_data.clone(),
                    });
                }
            }
        }

        self.emit_all(events);
        if let Some(node) = entered {
            self.arm_auto_advance(&node);
        }
        true
    }

    /// Per-node-type behavior on entry. Delay nodes arm a one-shot timer;
    /// condition nodes are evaluated for observers but never auto-completed
    /// (the renderer shows the branch UI and picks the output). Everything
    /// else waits for an explicit `complete_step`.
    fn arm_auto_advance(&self, node: &Node) {
        if node.is_condition() {
            let result = self.evaluate_condition(node);
            self.inner.bus.emit(&EngineEvent::ConditionEvaluated {
                node_id: node.id.clone(),
                result,
            });
            return;
        }

        if !node.is_delay() {
            return;
        }
        let Some(config) = node.delay_config() else {
            debug!(node_id = %node.id, "delay node config did not parse; waiting for manual completion");
            return;
        };

        let delay_ms = config.delay_ms();
        let guard = TimerGuard {
            epoch: self.inner.epoch.load(Ordering::SeqCst),
            node_id: node.id.clone(),
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let engine = self.clone();
                handle.spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    engine.fire_delay(guard, delay_ms);
                });
            }
            Err(_) => {
                warn!(node_id = %node.id, "no tokio runtime; delay node will not auto-advance");
            }
        }
    }

    fn fire_delay(&self, guard: TimerGuard, delay_ms: u64) {
        // camelCase key, matching the editor wire vocabulary the renderers read
        let mut data = Map::new();
        data.insert("delayed".to_string(), json!(true));
        data.insert("delayMs".to_string(), json!(delay_ms));
        self.complete_internal(DEFAULT_OUTPUT, data, Some(guard));
    }
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("definition", &self.inner.definition.id)
            .field("state", &*self.lock_state())
            .finish()
    }
}
