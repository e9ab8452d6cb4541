//! # Boothflow
//!
//! An in-process workflow execution engine for unattended event kiosks:
//! event hosts author multi-step interactive flows (touch screen, take
//! photo, apply filter, print or share) as a directed graph of typed steps
//! in a visual editor, and the engine executes that graph on the kiosk —
//! branching, timed auto-advance, undo, and mid-flow recovery included.
//!
//! ## Features
//!
//! - **Graph-as-data definitions** - Step kinds are string tags with
//!   free-form config, loaded from the editor's JSON export
//! - **Single active run** - One engine instance drives one run with one
//!   current node; snapshots are the only state callers see
//! - **Timed auto-advance** - Delay nodes complete themselves, with stale
//!   timers guarded by run/node identity
//! - **Observer events** - Synchronous, registration-ordered delivery with
//!   per-listener panic isolation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use boothflow::{WorkflowEngine, WorkflowLoader, EngineEvent};
//!
//! fn main() -> Result<(), boothflow::LoadError> {
//!     let definition = WorkflowLoader::from_json(
//!         r#"{
//!             "id": "wf-1",
//!             "name": "Photo Booth",
//!             "steps": {
//!                 "nodes": [
//!                     {"id": "touch", "type": "trigger"},
//!                     {"id": "shoot", "type": "capture"}
//!                 ],
//!                 "edges": [{"source": "touch", "target": "shoot"}]
//!             }
//!         }"#,
//!     )?;
//!
//!     let engine = WorkflowEngine::new(definition);
//!     engine.on(|event| {
//!         if let EngineEvent::StepEntered { node_id, .. } = event {
//!             println!("render step {node_id}");
//!         }
//!     });
//!
//!     engine.start();
//!     engine.advance(); // guest touched the screen
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod workflow;

// Re-export main types
pub use engine::{
    EngineEvent, EventBus, ExecutionState, ExecutionStatus, GraphIndex, ListenerId, StepRecord,
    WorkflowEngine,
};
pub use workflow::{
    evaluate_condition_config, ConditionConfig, DelayConfig, DelayUnit, Edge, FlowGraph, LoadError,
    Node, Position, WorkflowDefinition, WorkflowLoader, DEFAULT_OUTPUT,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::engine::{
        EngineEvent, ExecutionState, ExecutionStatus, ListenerId, StepRecord, WorkflowEngine,
    };
    pub use crate::workflow::{
        evaluate_condition_config, ConditionConfig, Edge, FlowGraph, LoadError, Node, Position,
        WorkflowDefinition, WorkflowLoader, DEFAULT_OUTPUT,
    };
}
