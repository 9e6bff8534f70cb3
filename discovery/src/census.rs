//! Master Census
//!
//! Counts live master candidates by listing the registration entries they
//! keep in the coordination ensemble. Each live master owns exactly one
//! `info_*` entry; the count is reported, not enforced.

use crate::coordination::CoordinationClient;
use crate::error::DiscoveryResult;
use crate::metadata;
use crate::state::{ClusterState, EnsembleConfig};
use serde::{Deserialize, Serialize};

/// Prefix of the registration entries masters create
pub const MASTER_INFO_PREFIX: &str = "info_";

/// Number of names starting with `info_` (case-sensitive)
pub fn count_info_entries<S: AsRef<str>>(children: &[S]) -> usize {
    children
        .iter()
        .filter(|name| name.as_ref().starts_with(MASTER_INFO_PREFIX))
        .count()
}

/// Configured quorum next to the number of masters actually registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumReport {
    pub quorum: u32,
    pub registered: usize,
    pub ensemble: EnsembleConfig,
}

impl QuorumReport {
    pub fn has_quorum(&self) -> bool {
        self.registered >= self.quorum as usize
    }

    /// Masters missing before quorum is reached again
    pub fn shortfall(&self) -> usize {
        (self.quorum as usize).saturating_sub(self.registered)
    }
}

/// Master counting over short-lived coordination sessions
#[derive(Debug, Clone)]
pub struct MasterCensus {
    client: CoordinationClient,
}

impl MasterCensus {
    pub fn new(client: CoordinationClient) -> Self {
        Self { client }
    }

    /// Census against a real ZooKeeper ensemble
    #[cfg(feature = "zookeeper")]
    pub fn zookeeper(timeout: std::time::Duration) -> Self {
        Self::new(CoordinationClient::zookeeper(timeout))
    }

    /// Count `info_*` children of `ensemble.path`.
    ///
    /// The session is opened for this call only and closed before returning,
    /// on success and on failure alike.
    pub fn count_registered_masters(&self, ensemble: &EnsembleConfig) -> DiscoveryResult<usize> {
        let children = self
            .client
            .list_children(&ensemble.hosts, &ensemble.absolute_path())?;
        let count = count_info_entries(&children);

        tracing::debug!(
            "Ensemble {} lists {} children under {}, {} registered masters",
            ensemble.hosts,
            children.len(),
            ensemble.path,
            count
        );
        Ok(count)
    }

    /// Quorum size and ensemble from `state`, then a census of that ensemble
    pub fn quorum_report(&self, state: &ClusterState) -> DiscoveryResult<QuorumReport> {
        let quorum = metadata::quorum_size(state)?;
        let ensemble = metadata::ensemble_config(state)?;
        let registered = self.count_registered_masters(&ensemble)?;

        let report = QuorumReport {
            quorum,
            registered,
            ensemble,
        };
        if !report.has_quorum() {
            tracing::warn!(
                "Only {} masters registered, quorum is {}",
                report.registered,
                report.quorum
            );
        }
        Ok(report)
    }
}
