//! Coordination Client
//!
//! Short-lived access to the coordination ensemble (ZooKeeper in production).
//! Every operation connects, runs one query, and disconnects; no session is
//! held across calls.
//!
//! The backend sits behind [`CoordinationConnector`] / [`CoordinationSession`]
//! so callers can inject their own. With the `zookeeper` feature enabled,
//! [`ZkConnector`] talks to a real ensemble.

use crate::error::DiscoveryResult;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "zookeeper")]
mod zk;

#[cfg(feature = "zookeeper")]
pub use zk::ZkConnector;

/// An open session against one ensemble
pub trait CoordinationSession {
    /// Names of the direct children of `path`
    fn get_children(&self, path: &str) -> DiscoveryResult<Vec<String>>;

    /// Payload stored at `path`
    fn get_data(&self, path: &str) -> DiscoveryResult<Vec<u8>>;

    /// Tear the session down
    fn close(&mut self) -> DiscoveryResult<()>;
}

/// Opens sessions against an ensemble given as `host:port[,host:port...]`
pub trait CoordinationConnector: Send + Sync {
    /// Connect read-only, failing with `EnsembleUnavailable` if no member
    /// can be reached within `timeout`
    fn connect(
        &self,
        hosts: &str,
        timeout: Duration,
    ) -> DiscoveryResult<Box<dyn CoordinationSession>>;
}

/// Session that is closed when dropped, on every exit path
struct ScopedSession {
    hosts: String,
    session: Box<dyn CoordinationSession>,
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        match self.session.close() {
            Ok(()) => tracing::debug!("Closed coordination session to {}", self.hosts),
            Err(e) => tracing::warn!(
                "Failed to close coordination session to {}: {}",
                self.hosts,
                e
            ),
        }
    }
}

/// Connect-query-disconnect client for the coordination ensemble
#[derive(Clone)]
pub struct CoordinationClient {
    connector: Arc<dyn CoordinationConnector>,
    timeout: Duration,
}

impl CoordinationClient {
    pub fn new(connector: Arc<dyn CoordinationConnector>, timeout: Duration) -> Self {
        Self { connector, timeout }
    }

    /// Client backed by a real ZooKeeper ensemble
    #[cfg(feature = "zookeeper")]
    pub fn zookeeper(timeout: Duration) -> Self {
        Self::new(Arc::new(ZkConnector), timeout)
    }

    /// Run `f` inside a fresh session that is closed before returning,
    /// including when `f` fails
    pub fn with_session<T>(
        &self,
        hosts: &str,
        f: impl FnOnce(&dyn CoordinationSession) -> DiscoveryResult<T>,
    ) -> DiscoveryResult<T> {
        tracing::debug!("Opening coordination session to {}", hosts);
        let scoped = ScopedSession {
            hosts: hosts.to_string(),
            session: self.connector.connect(hosts, self.timeout)?,
        };
        f(&*scoped.session)
    }

    /// List the direct children of `path`
    pub fn list_children(&self, hosts: &str, path: &str) -> DiscoveryResult<Vec<String>> {
        self.with_session(hosts, |session| session.get_children(path))
    }

    /// Read the payload stored at `path`
    pub fn read_data(&self, hosts: &str, path: &str) -> DiscoveryResult<Vec<u8>> {
        self.with_session(hosts, |session| session.get_data(path))
    }
}

impl std::fmt::Debug for CoordinationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinationClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
