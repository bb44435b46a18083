use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fundamentals keyed by metric name. Values stay as the provider sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinancialSnapshot(BTreeMap<String, Value>);

impl FinancialSnapshot {
    pub fn new(metrics: BTreeMap<String, Value>) -> Self {
        Self(metrics)
    }

    pub fn get(&self, metric: &str) -> Option<&Value> {
        self.0.get(metric)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(metric, rendered value)` pairs for every truthy metric, in metric-name order.
    pub fn truthy_entries(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.0
            .iter()
            .filter(|(_, v)| is_truthy(v))
            .map(|(k, v)| (k.as_str(), render_value(v)))
    }
}

impl FromIterator<(String, Value)> for FinancialSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Null, false, zero, and empty strings/arrays/objects are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
