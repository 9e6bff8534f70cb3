//! Task/Attribute Aggregator
//!
//! Pure functions over state documents and task lists. Malformed individual
//! records are skipped by the typed views in [`crate::state`]; nothing here
//! fails.

use crate::job::JobConfig;
use crate::state::{AttributeGrouping, ClusterState, TaskRecord};

/// Tasks whose state is (`want_running = true`) or is not (`false`)
/// `TASK_RUNNING`, in input order
pub fn filter_by_state(tasks: &[TaskRecord], want_running: bool) -> Vec<&TaskRecord> {
    tasks
        .iter()
        .filter(|task| task.is_running() == want_running)
        .collect()
}

pub fn filter_running_tasks(tasks: &[TaskRecord]) -> Vec<&TaskRecord> {
    filter_by_state(tasks, true)
}

pub fn filter_not_running_tasks(tasks: &[TaskRecord]) -> Vec<&TaskRecord> {
    filter_by_state(tasks, false)
}

/// Hostnames of the agents in `state.slaves`, bucketed by the value of
/// `attribute_key`.
///
/// Agents without the attribute are left out. A host reporting the same value
/// twice appears twice.
pub fn group_agents_by_attribute(state: &ClusterState, attribute_key: &str) -> AttributeGrouping {
    let mut grouping = AttributeGrouping::new();

    for agent in state.agents() {
        if let Some(value) = agent.attributes.get(attribute_key) {
            grouping
                .entry(value.clone())
                .or_default()
                .push(agent.hostname);
        }
    }

    grouping
}

/// Tasks of active frameworks whose id contains `job_id`
pub fn current_tasks(state: &ClusterState, job_id: &str) -> Vec<TaskRecord> {
    state
        .active_tasks()
        .into_iter()
        .filter(|task| task.id.as_deref().is_some_and(|id| id.contains(job_id)))
        .collect()
}

/// [`current_tasks`] addressed by a resolved job
pub fn current_tasks_for_job(state: &ClusterState, job: &JobConfig) -> Vec<TaskRecord> {
    current_tasks(state, &job.job_id())
}
