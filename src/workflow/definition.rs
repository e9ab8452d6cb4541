//! Workflow definition types
//!
//! These types mirror the JSON the visual editor exports: a workflow is a
//! directed graph of typed step nodes connected by edges with named output
//! handles. The engine treats the definition as read-only; a single
//! definition can back any number of engine instances.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output label used when a step completes without naming an output, and
/// the handle label edges fall back to during resolution.
pub const DEFAULT_OUTPUT: &str = "default";

// ============================================================================
// Workflow definition
// ============================================================================

/// A complete workflow definition as authored in the editor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    /// Definition identifier (assigned by the editor/persistence layer)
    pub id: String,

    /// Display name
    pub name: String,

    /// Display description
    #[serde(default)]
    pub description: String,

    /// Flow category (e.g. "photo_booth", "guest_checkin"); opaque to the engine
    #[serde(default)]
    pub flow_type: String,

    /// The step graph
    pub steps: FlowGraph,
}

/// The node/edge graph inside a definition
///
/// Declaration order matters: start-node fallback and edge resolution are
/// both first-match-wins over these lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,

    #[serde(default)]
    pub edges: Vec<Edge>,
}

// ============================================================================
// Nodes
// ============================================================================

/// Editor canvas position
///
/// Layout-only, except that `x` breaks ties between equally valid start
/// nodes so runs are reproducible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// One step in the flow
///
/// Step kinds are string tags with free-form `config` payloads rather than
/// a type per kind; the engine only gives special treatment to the trigger
/// family, `delay`, and `condition`, and treats everything else opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique within the definition
    pub id: String,

    /// Step kind tag (e.g. "trigger", "capture", "delay", "condition", "print")
    #[serde(rename = "type")]
    pub node_type: String,

    /// Kind-specific parameters (delay duration, condition operator, ...)
    #[serde(default)]
    pub config: Value,

    /// Named exit points this step may complete with (e.g. "default", "retake")
    #[serde(default)]
    pub outputs: Vec<String>,

    /// Editor canvas position
    #[serde(default)]
    pub position: Position,
}

impl Node {
    /// Whether this node belongs to the trigger/start family.
    ///
    /// The editor palette names these "trigger", "touch_trigger",
    /// "qr_trigger", "trigger_screen", so the family test is a prefix or
    /// suffix match on the tag.
    pub fn is_trigger(&self) -> bool {
        self.node_type.starts_with("trigger") || self.node_type.ends_with("trigger")
    }

    /// Whether this node auto-advances on a timer
    pub fn is_delay(&self) -> bool {
        self.node_type == "delay"
    }

    /// Whether this node is a condition/branch node
    pub fn is_condition(&self) -> bool {
        self.node_type == "condition"
    }

    /// Typed view of a delay node's config, if it parses as one
    pub fn delay_config(&self) -> Option<DelayConfig> {
        if !self.is_delay() {
            return None;
        }
        serde_json::from_value(self.config.clone()).ok()
    }
}

// ============================================================================
// Edges
// ============================================================================

/// A directed connection from one node's output to another node
///
/// Multiple edges may share a source with different handles (branching). If
/// duplicates exist for the same (source, handle) pair, the first declared
/// edge wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Editor-assigned edge id
    #[serde(default)]
    pub id: Option<String>,

    /// Source node id
    pub source: String,

    /// Target node id
    pub target: String,

    /// Which source output this edge satisfies; unset means the default output
    #[serde(default)]
    pub source_handle: Option<String>,
}

// ============================================================================
// Delay config
// ============================================================================

/// Time unit for delay nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
}

/// Parsed config of a `delay` node
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Duration in `unit`s
    pub duration: f64,

    /// Unit of `duration`; defaults to seconds
    #[serde(default)]
    pub unit: DelayUnit,
}

impl DelayConfig {
    /// Delay in whole milliseconds, clamped to zero for negative durations
    pub fn delay_ms(&self) -> u64 {
        let factor = match self.unit {
            DelayUnit::Seconds => 1_000.0,
            DelayUnit::Minutes => 60_000.0,
            DelayUnit::Hours => 3_600_000.0,
        };
        (self.duration * factor).max(0.0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(node_type: &str, config: Value) -> Node {
        Node {
            id: "n1".to_string(),
            node_type: node_type.to_string(),
            config,
            outputs: vec![],
            position: Position::default(),
        }
    }

    #[test]
    fn test_trigger_family() {
        assert!(node("trigger", Value::Null).is_trigger());
        assert!(node("touch_trigger", Value::Null).is_trigger());
        assert!(node("qr_trigger", Value::Null).is_trigger());
        assert!(node("trigger_screen", Value::Null).is_trigger());
        assert!(!node("capture", Value::Null).is_trigger());
        assert!(!node("delay", Value::Null).is_trigger());
    }

    #[test]
    fn test_delay_config_units() {
        let n = node("delay", json!({"duration": 5, "unit": "seconds"}));
        assert_eq!(n.delay_config().unwrap().delay_ms(), 5_000);

        let n = node("delay", json!({"duration": 2, "unit": "minutes"}));
        assert_eq!(n.delay_config().unwrap().delay_ms(), 120_000);

        let n = node("delay", json!({"duration": 1, "unit": "hours"}));
        assert_eq!(n.delay_config().unwrap().delay_ms(), 3_600_000);
    }

    #[test]
    fn test_delay_config_defaults_to_seconds() {
        let n = node("delay", json!({"duration": 1.5}));
        assert_eq!(n.delay_config().unwrap().delay_ms(), 1_500);
    }

    #[test]
    fn test_delay_config_malformed() {
        assert!(node("delay", json!({"unit": "seconds"})).delay_config().is_none());
        assert!(node("capture", json!({"duration": 5})).delay_config().is_none());
    }

    #[test]
    fn test_definition_parses_editor_json() {
        let def: WorkflowDefinition = serde_json::from_str(
            r#"{
                "id": "wf-1",
                "name": "Photo Booth",
                "flowType": "photo_booth",
                "steps": {
                    "nodes": [
                        {"id": "a", "type": "trigger", "position": {"x": 10, "y": 20}},
                        {"id": "b", "type": "capture", "outputs": ["default", "retake"]}
                    ],
                    "edges": [
                        {"source": "a", "target": "b", "sourceHandle": "default"}
                    ]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(def.flow_type, "photo_booth");
        assert_eq!(def.steps.nodes.len(), 2);
        assert_eq!(def.steps.nodes[0].position.x, 10.0);
        assert_eq!(def.steps.nodes[1].outputs, vec!["default", "retake"]);
        assert_eq!(def.steps.edges[0].source_handle.as_deref(), Some("default"));
    }
}
