//! Condition evaluation for branch nodes
//!
//! A condition node's config names a collected-data field, an operator, and
//! a comparison value. Evaluation is a pure function of the config and the
//! data collected so far; it never fails. Unknown operators and malformed
//! configs evaluate to `false` (fail-closed), and missing fields coerce to
//! an empty/zero value per the operator's coercion rule.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parsed config of a `condition` node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionConfig {
    /// Collected-data field to test
    pub field: String,

    /// One of: equals, not_equals, greater_than, less_than, contains,
    /// is_true, is_false
    pub operator: String,

    /// Comparison value; ignored by is_true/is_false
    #[serde(default)]
    pub value: Value,
}

/// Evaluate a condition config against collected data
pub fn evaluate(config: &ConditionConfig, collected: &Map<String, Value>) -> bool {
    let field = collected.get(&config.field).unwrap_or(&Value::Null);

    match config.operator.as_str() {
        "equals" => as_string(field) == as_string(&config.value),
        "not_equals" => as_string(field) != as_string(&config.value),
        "greater_than" => as_number(field) > as_number(&config.value),
        "less_than" => as_number(field) < as_number(&config.value),
        "contains" => as_string(field).contains(&as_string(&config.value)),
        "is_true" => is_truthy(field),
        "is_false" => !is_truthy(field),
        other => {
            tracing::debug!(operator = other, "unrecognized condition operator");
            false
        }
    }
}

/// String coercion: null becomes empty, scalars render bare, composites
/// render as JSON
fn as_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric coercion: null is zero, unparseable strings are NaN so that both
/// greater_than and less_than come out false
fn as_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Truthiness: false for null, false, zero, and the empty string
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
