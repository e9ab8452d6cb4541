//! Workflow definition types and parsing
//!
//! This module contains everything about the static, authored side of a
//! workflow:
//! - `definition` - WorkflowDefinition, FlowGraph, Node, Edge, delay config
//! - `condition` - branch-node condition evaluation
//! - `loader` - load editor-exported JSON definitions

pub mod condition;
pub mod definition;
pub mod loader;

pub use condition::{evaluate as evaluate_condition_config, ConditionConfig};
pub use definition::{
    DelayConfig, DelayUnit, Edge, FlowGraph, Node, Position, WorkflowDefinition, DEFAULT_OUTPUT,
};
pub use loader::{LoadError, WorkflowLoader};
