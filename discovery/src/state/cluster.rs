//! State documents returned by masters and agents

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::state::task::TaskRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Attribute value → hostnames of the agents reporting it.
///
/// Hostnames are not deduplicated within a bucket.
pub type AttributeGrouping = HashMap<String, Vec<String>>;

/// State snapshot of a master (`/state.json`) or of a single agent.
///
/// The document is kept as raw JSON; typed views are extracted on demand and
/// malformed sub-records are skipped rather than failing the whole document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ClusterState {
    raw: Map<String, Value>,
}

impl ClusterState {
    /// Wrap a parsed JSON document; it must be an object
    pub fn from_value(value: Value) -> DiscoveryResult<Self> {
        match value {
            Value::Object(raw) => Ok(Self { raw }),
            other => Err(DiscoveryError::MalformedState(format!(
                "state document is not an object (got {})",
                json_kind(&other)
            ))),
        }
    }

    /// Parse a JSON string
    pub fn from_json_str(s: &str) -> DiscoveryResult<Self> {
        let value: Value = serde_json::from_str(s)
            .map_err(|e| DiscoveryError::MalformedState(format!("invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Top-level field lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// A value from the `flags` section
    pub fn flag(&self, name: &str) -> Option<&Value> {
        self.raw.get("flags")?.as_object()?.get(name)
    }

    /// Raw document
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.raw)
    }

    /// Agent records from `slaves`, in document order.
    ///
    /// A missing or non-array `slaves` yields nothing; entries without a
    /// string hostname are skipped.
    pub fn agents(&self) -> Vec<AgentRecord> {
        let Some(slaves) = self.raw.get("slaves").and_then(Value::as_array) else {
            return Vec::new();
        };

        slaves
            .iter()
            .enumerate()
            .filter_map(|(idx, slave)| {
                let agent = AgentRecord::from_value(slave);
                if agent.is_none() {
                    tracing::debug!("Skipping malformed agent record at slaves[{}]", idx);
                }
                agent
            })
            .collect()
    }

    /// Tasks of active frameworks (`frameworks[].tasks[]`), in document order.
    ///
    /// Completed frameworks and completed tasks are not included.
    pub fn active_tasks(&self) -> Vec<TaskRecord> {
        let Some(frameworks) = self.raw.get("frameworks").and_then(Value::as_array) else {
            return Vec::new();
        };

        frameworks
            .iter()
            .filter_map(|fw| fw.get("tasks").and_then(Value::as_array))
            .flatten()
            .filter_map(|task| match TaskRecord::from_value(task) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::debug!("Skipping malformed task record: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// One agent (slave) of the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub hostname: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl AgentRecord {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Lenient extraction from a `slaves[]` entry.
    ///
    /// Scalar attribute values (numbers, booleans) are rendered to strings;
    /// arrays, objects and nulls are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let hostname = value.get("hostname")?.as_str()?.to_string();

        let attributes = value
            .get("attributes")
            .and_then(Value::as_object)
            .map(|attrs| {
                attrs
                    .iter()
                    .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k.clone(), s)))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            hostname,
            attributes,
        })
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Coordination ensemble location parsed from `zk://<hosts>/<path>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Comma-separated `host:port` list
    pub hosts: String,
    /// Root path below the hosts, without the `zk://host/` prefix
    pub path: String,
}

impl EnsembleConfig {
    pub fn new(hosts: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            hosts: hosts.into(),
            path: path.into(),
        }
    }

    /// `path` as an absolute znode path
    pub fn absolute_path(&self) -> String {
        absolute_path(&self.path)
    }
}

/// Prefix a `/` unless already present
pub(crate) fn absolute_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_non_object() {
        let err = ClusterState::from_value(json!([1, 2])).unwrap_err();
        assert!(matches!(err, DiscoveryError::MalformedState(_)));
        assert!(ClusterState::from_json_str("not json").is_err());
    }

    #[test]
    fn test_flag_lookup() {
        let state = ClusterState::from_value(json!({"flags": {"quorum": "2"}})).unwrap();
        assert_eq!(state.flag("quorum"), Some(&json!("2")));
        assert_eq!(state.flag("zk"), None);

        let no_flags = ClusterState::from_value(json!({})).unwrap();
        assert_eq!(no_flags.flag("quorum"), None);
    }

    #[test]
    fn test_agents_skips_malformed_entries() {
        let state = ClusterState::from_value(json!({
            "slaves": [
                {"hostname": "a", "attributes": {"rack": "1", "cores": 8, "ssd": true}},
                {"attributes": {"rack": "2"}},
                "garbage",
                {"hostname": "c"},
                {"hostname": "d", "attributes": {"list": [1], "rack": "3"}}
            ]
        }))
        .unwrap();

        let agents = state.agents();
        let hosts: Vec<&str> = agents.iter().map(|a| a.hostname.as_str()).collect();
        assert_eq!(hosts, vec!["a", "c", "d"]);

        assert_eq!(agents[0].attribute("cores"), Some("8"));
        assert_eq!(agents[0].attribute("ssd"), Some("true"));
        assert!(agents[1].attributes.is_empty());
        assert_eq!(agents[2].attribute("list"), None);
        assert_eq!(agents[2].attribute("rack"), Some("3"));
    }

    #[test]
    fn test_agents_missing_slaves() {
        let state = ClusterState::from_value(json!({"flags": {}})).unwrap();
        assert!(state.agents().is_empty());
    }

    #[test]
    fn test_active_tasks_only_from_running_frameworks() {
        let state = ClusterState::from_value(json!({
            "frameworks": [
                {
                    "id": "fw-1",
                    "tasks": [
                        {"id": "svc.main.1", "state": "TASK_RUNNING"},
                        {"id": "broken"}
                    ],
                    "completed_tasks": [{"id": "svc.main.0", "state": "TASK_FINISHED"}]
                },
                {"id": "fw-2", "tasks": [{"id": "other.canary.1", "state": "TASK_STAGING"}]}
            ],
            "completed_frameworks": [
                {"id": "fw-0", "tasks": [{"id": "old.main.1", "state": "TASK_KILLED"}]}
            ]
        }))
        .unwrap();

        let ids: Vec<String> = state
            .active_tasks()
            .into_iter()
            .filter_map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["svc.main.1", "other.canary.1"]);
    }

    #[test]
    fn test_ensemble_absolute_path() {
        assert_eq!(EnsembleConfig::new("zk1:2181", "mesos").absolute_path(), "/mesos");
        assert_eq!(
            EnsembleConfig::new("zk1:2181", "/mesos/prod").absolute_path(),
            "/mesos/prod"
        );
    }
}
