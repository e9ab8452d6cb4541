//! Workflow execution engine module
//!
//! This module contains:
//! - `executor` - The WorkflowEngine façade driving a single run
//! - `graph` - Build-once lookup index over the definition graph
//! - `state` - Execution status, step records, collected data
//! - `events` - Event bus for step renderers and observers

pub mod events;
pub mod executor;
pub mod graph;
pub mod state;

pub use events::{EngineEvent, EventBus, ListenerId};
pub use executor::WorkflowEngine;
pub use graph::GraphIndex;
pub use state::{ExecutionState, ExecutionStatus, StepRecord};
