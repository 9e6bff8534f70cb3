//! Mesos Cluster Discovery Library
//!
//! This library provides:
//! - Leader discovery behind an injectable [`LeaderResolver`]
//! - Leader state, leader metrics and agent state fetches over HTTP
//! - Quorum and coordination-ensemble extraction from leader state
//! - A census of registered masters in the coordination ensemble
//! - Task filtering by run state and agent grouping by attribute
//!
//! Every call is a fresh, blocking, stateless query. Connections are opened
//! and closed within the call, each request is bounded by a timeout, and
//! failures come back as [`DiscoveryError`] without internal retries.
//!
//! # Features
//!
//! - `zookeeper`: real ZooKeeper sessions for the master census and for
//!   `zk://` master locators. Without it, callers inject their own
//!   [`CoordinationConnector`].
//!
//! # Usage
//!
//! ```ignore
//! use mesos_discovery::{ClusterConfig, ClusterStateFetcher, MasterCensus};
//!
//! let config = ClusterConfig::load("/etc/mesos-discovery.toml")?;
//! let fetcher = ClusterStateFetcher::from_config(config, None)?;
//!
//! let state = fetcher.fetch_leader_state()?;
//! let ensemble = mesos_discovery::metadata::ensemble_config(&state)?;
//! let masters = MasterCensus::zookeeper(fetcher.config().coordination_timeout())
//!     .count_registered_masters(&ensemble)?;
//! ```

pub mod aggregate;
pub mod census;
pub mod config;
pub mod coordination;
pub mod error;
pub mod fetcher;
pub mod job;
pub mod leader;
pub mod metadata;
pub mod state;

pub use error::{DiscoveryError, DiscoveryResult};

pub use config::{ClusterConfig, MESOS_AGENT_PORT, MESOS_MASTER_PORT};

pub use state::{
    AgentRecord, AttributeGrouping, ClusterState, EnsembleConfig, TaskRecord, TaskState,
};

pub use job::JobConfig;

pub use coordination::{CoordinationClient, CoordinationConnector, CoordinationSession};

#[cfg(feature = "zookeeper")]
pub use coordination::ZkConnector;

pub use leader::{
    CoordinationLeaderResolver, LeaderResolver, MasterLocator, RedirectLeaderResolver,
    StaticLeader,
};

pub use fetcher::ClusterStateFetcher;

pub use metadata::{ensemble_config, quorum_size};

pub use census::{MasterCensus, QuorumReport};

pub use aggregate::{
    current_tasks, filter_by_state, filter_not_running_tasks, filter_running_tasks,
    group_agents_by_attribute,
};
