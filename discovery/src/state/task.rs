//! Task records and the Mesos run-state vocabulary

use crate::error::{DiscoveryError, DiscoveryResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Mesos task run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    TaskStaging,
    TaskStarting,
    TaskRunning,
    TaskKilling,
    TaskFinished,
    TaskFailed,
    TaskKilled,
    TaskLost,
    TaskError,
    Unknown,
}

impl TaskState {
    /// Wire literal of the only state treated as active
    pub const RUNNING: &'static str = "TASK_RUNNING";

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskStaging => "TASK_STAGING",
            Self::TaskStarting => "TASK_STARTING",
            Self::TaskRunning => "TASK_RUNNING",
            Self::TaskKilling => "TASK_KILLING",
            Self::TaskFinished => "TASK_FINISHED",
            Self::TaskFailed => "TASK_FAILED",
            Self::TaskKilled => "TASK_KILLED",
            Self::TaskLost => "TASK_LOST",
            Self::TaskError => "TASK_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::TaskRunning)
    }
}

impl From<&str> for TaskState {
    fn from(s: &str) -> Self {
        match s {
            "TASK_STAGING" => Self::TaskStaging,
            "TASK_STARTING" => Self::TaskStarting,
            "TASK_RUNNING" => Self::TaskRunning,
            "TASK_KILLING" => Self::TaskKilling,
            "TASK_FINISHED" => Self::TaskFinished,
            "TASK_FAILED" => Self::TaskFailed,
            "TASK_KILLED" => Self::TaskKilled,
            "TASK_LOST" => Self::TaskLost,
            "TASK_ERROR" => Self::TaskError,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One task as reported by a master or agent.
///
/// Only `state` is required; everything the typed fields don't cover is kept
/// in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slave_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskRecord {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            id: None,
            name: None,
            framework_id: None,
            slave_id: None,
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn from_value(value: &Value) -> DiscoveryResult<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| DiscoveryError::MalformedState(format!("task record: {}", e)))
    }

    pub fn task_state(&self) -> TaskState {
        TaskState::from(self.state.as_str())
    }

    /// Exact, case-sensitive comparison against `TASK_RUNNING`
    pub fn is_running(&self) -> bool {
        self.state == TaskState::RUNNING
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_state_from_str() {
        assert_eq!(TaskState::from("TASK_RUNNING"), TaskState::TaskRunning);
        assert_eq!(TaskState::from("TASK_LOST"), TaskState::TaskLost);
        assert_eq!(TaskState::from("task_running"), TaskState::Unknown);
        assert_eq!(TaskState::from("RUNNING"), TaskState::Unknown);
    }

    #[test]
    fn test_only_task_running_is_running() {
        assert!(TaskState::TaskRunning.is_running());
        assert!(!TaskState::TaskStaging.is_running());
        assert!(!TaskState::TaskKilling.is_running());
        assert!(!TaskState::Unknown.is_running());
    }

    #[test]
    fn test_task_record_keeps_unknown_fields() {
        let task = TaskRecord::from_value(&json!({
            "id": "svc.main.abc",
            "state": "TASK_RUNNING",
            "resources": {"cpus": 0.5}
        }))
        .unwrap();

        assert!(task.is_running());
        assert_eq!(task.id.as_deref(), Some("svc.main.abc"));
        assert_eq!(task.extra["resources"]["cpus"], json!(0.5));
    }

    #[test]
    fn test_task_record_requires_state() {
        let err = TaskRecord::from_value(&json!({"id": "x"})).unwrap_err();
        assert!(matches!(err, DiscoveryError::MalformedState(_)));
    }

    #[test]
    fn test_is_running_is_case_sensitive() {
        assert!(!TaskRecord::new("task_running").is_running());
        assert!(!TaskRecord::new("TASK_FAILED").is_running());
        assert_eq!(TaskRecord::new("TASK_RUNNING").task_state(), TaskState::TaskRunning);
    }
}
