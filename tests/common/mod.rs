use std::sync::{Arc, Mutex, Once};

use boothflow::{
    Edge, EngineEvent, FlowGraph, Node, Position, WorkflowDefinition, WorkflowEngine,
};
use serde_json::{json, Map, Value};

static TRACING: Once = Once::new();

/// Route engine tracing through the test harness; verbosity follows RUST_LOG
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn node(id: &str, node_type: &str) -> Node {
    Node {
        id: id.to_string(),
        node_type: node_type.to_string(),
        config: Value::Null,
        outputs: vec![],
        position: Position::default(),
    }
}

pub fn delay_node(id: &str, duration_secs: f64) -> Node {
    Node {
        config: json!({"duration": duration_secs, "unit": "seconds"}),
        ..node(id, "delay")
    }
}

pub fn condition_node(id: &str, field: &str, operator: &str, value: Value) -> Node {
    Node {
        config: json!({"field": field, "operator": operator, "value": value}),
        outputs: vec!["then".to_string(), "else".to_string()],
        ..node(id, "condition")
    }
}

pub fn edge(source: &str, target: &str) -> Edge {
    Edge {
        id: None,
        source: source.to_string(),
        target: target.to_string(),
        source_handle: None,
    }
}

pub fn handle_edge(source: &str, target: &str, handle: &str) -> Edge {
    Edge {
        source_handle: Some(handle.to_string()),
        ..edge(source, target)
    }
}

pub fn definition(nodes: Vec<Node>, edges: Vec<Edge>) -> WorkflowDefinition {
    WorkflowDefinition {
        id: "wf-test".to_string(),
        name: "test flow".to_string(),
        description: String::new(),
        flow_type: "photo_booth".to_string(),
        steps: FlowGraph { nodes, edges },
    }
}

/// trigger -> capture -> delay(1s) -> print, single default edges
pub fn linear_photo_flow() -> WorkflowDefinition {
    definition(
        vec![
            node("touch", "trigger"),
            node("shoot", "capture"),
            delay_node("countdown", 1.0),
            node("print", "print"),
        ],
        vec![
            edge("touch", "shoot"),
            edge("shoot", "countdown"),
            edge("countdown", "print"),
        ],
    )
}

pub fn data(entries: &[(&str, Value)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Subscribe a listener that records compact event tags for assertions
pub fn record_events(engine: &WorkflowEngine) -> Arc<Mutex<Vec<String>>> {
    init_tracing();
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    engine.on(move |event| {
        let tag = match event {
            EngineEvent::StepEntered { node_id, .. } => format!("entered:{node_id}"),
            EngineEvent::StepCompleted { node_id, .. } => format!("completed:{node_id}"),
            EngineEvent::ConditionEvaluated { node_id, result } => {
                format!("condition:{node_id}={result}")
            }
            EngineEvent::WorkflowCompleted { .. } => "workflow-completed".to_string(),
            EngineEvent::WorkflowError { message } => format!("error:{message}"),
            EngineEvent::NoNextStep { node_id, .. } => format!("no-next:{node_id}"),
        };
        sink.lock().unwrap().push(tag);
    });
    log
}
