//! Execution state
//!
//! The single mutable record of a run: where we are, what we have
//! collected, whether we are running. Owned exclusively by one engine
//! instance; callers only ever see cloned snapshots. `collected_data` is
//! always derivable by replaying `history` in order, which is what makes
//! undo safe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Run lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Error,
}

/// The recorded outcome of completing one step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    /// Node that was completed
    pub node_id: String,

    /// Output the step completed with
    pub output_id: String,

    /// Data the step contributed
    pub data: Map<String, Value>,

    /// When the step completed
    pub completed_at: DateTime<Utc>,
}

/// Snapshot-able state of a single run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    /// Unique id of this run
    pub run_id: String,

    pub status: ExecutionStatus,

    /// Active node, or `None` when idle/completed/error
    pub current_node_id: Option<String>,

    /// Append-only record of completed steps, cleared only by reset
    pub history: Vec<StepRecord>,

    /// Left-fold merge of every history entry's data, last write wins
    pub collected_data: Map<String, Value>,

    /// Failure reason, set only in `Error` status
    pub error: Option<String>,

    /// When `start()` was called
    pub started_at: Option<DateTime<Utc>>,
}

impl ExecutionState {
    /// Fresh idle state with a new run id
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            status: ExecutionStatus::Idle,
            current_node_id: None,
            history: Vec::new(),
            collected_data: Map::new(),
            error: None,
            started_at: None,
        }
    }

    /// Append a completed step and merge its data into `collected_data`
    pub fn record_step(&mut self, record: StepRecord) {
        merge(&mut self.collected_data, &record.data);
        self.history.push(record);
    }

    /// Remove and return the most recent step, rebuilding `collected_data`
    /// from the remaining history so no stale keys survive the undo
    pub fn pop_step(&mut self) -> Option<StepRecord> {
        let popped = self.history.pop()?;
        self.rebuild_collected();
        Some(popped)
    }

    fn rebuild_collected(&mut self) {
        let mut collected = Map::new();
        for record in &self.history {
            merge(&mut collected, &record.data);
        }
        self.collected_data = collected;
    }
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self::new()
    }
}

fn merge(collected: &mut Map<String, Value>, data: &Map<String, Value>) {
    for (key, value) in data {
        collected.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(node_id: &str, entries: &[(&str, Value)]) -> StepRecord {
        StepRecord {
            node_id: node_id.to_string(),
            output_id: "default".to_string(),
            data: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_state_is_idle() {
        let state = ExecutionState::new();
        assert_eq!(state.status, ExecutionStatus::Idle);
        assert!(state.current_node_id.is_none());
        assert!(state.history.is_empty());
        assert!(!state.run_id.is_empty());
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut state = ExecutionState::new();
        state.record_step(record("a", &[("name", json!("ava")), ("age", json!(20))]));
        state.record_step(record("b", &[("name", json!("ben"))]));

        assert_eq!(state.collected_data["name"], json!("ben"));
        assert_eq!(state.collected_data["age"], json!(20));
        assert_eq!(state.history.len(), 2);
    }

    #[test]
    fn test_pop_rebuilds_collected() {
        let mut state = ExecutionState::new();
        state.record_step(record("a", &[("name", json!("ava"))]));
        state.record_step(record("b", &[("name", json!("ben")), ("extra", json!(true))]));

        let popped = state.pop_step().unwrap();
        assert_eq!(popped.node_id, "b");

        // the overwrite and the extra key are both gone
        assert_eq!(state.collected_data["name"], json!("ava"));
        assert!(!state.collected_data.contains_key("extra"));
    }

    #[test]
    fn test_pop_empty_history() {
        let mut state = ExecutionState::new();
        assert!(state.pop_step().is_none());
    }

    #[test]
    fn test_collected_equals_replay() {
        let mut state = ExecutionState::new();
        state.record_step(record("a", &[("x", json!(1))]));
        state.record_step(record("b", &[("y", json!(2))]));
        state.record_step(record("c", &[("x", json!(3))]));

        let mut replayed = Map::new();
        for rec in &state.history {
            merge(&mut replayed, &rec.data);
        }
        assert_eq!(state.collected_data, replayed);
    }
}
