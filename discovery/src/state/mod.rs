//! Cluster data model
//!
//! Every value here is built fresh from one network response and never
//! mutated afterwards:
//! - [`ClusterState`]: the permissive state document of a master or agent
//! - [`AgentRecord`]: one agent's hostname and attributes
//! - [`TaskRecord`] / [`TaskState`]: one task and its run state
//! - [`EnsembleConfig`]: the coordination ensemble parsed from `flags.zk`

pub mod cluster;
pub mod task;

pub use cluster::{AgentRecord, AttributeGrouping, ClusterState, EnsembleConfig};
pub use task::{TaskRecord, TaskState};
