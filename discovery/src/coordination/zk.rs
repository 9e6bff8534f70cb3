//! ZooKeeper-backed coordination sessions

use super::{CoordinationConnector, CoordinationSession};
use crate::error::{DiscoveryError, DiscoveryResult};
use ::zookeeper::{WatchedEvent, Watcher, ZooKeeper};
use std::time::Duration;

struct LoggingWatcher;

impl Watcher for LoggingWatcher {
    fn handle(&self, event: WatchedEvent) {
        tracing::trace!("ZooKeeper event: {:?}", event);
    }
}

/// Connector for a real ZooKeeper ensemble
#[derive(Debug, Clone, Copy, Default)]
pub struct ZkConnector;

impl CoordinationConnector for ZkConnector {
    fn connect(
        &self,
        hosts: &str,
        timeout: Duration,
    ) -> DiscoveryResult<Box<dyn CoordinationSession>> {
        let zk = ZooKeeper::connect(hosts, timeout, LoggingWatcher)
            .map_err(|e| DiscoveryError::ensemble_unavailable(hosts, format!("{:?}", e)))?;
        Ok(Box::new(ZkSession {
            hosts: hosts.to_string(),
            zk: Some(zk),
        }))
    }
}

/// Open session. `ZooKeeper` sends `CloseSession` from its own `Drop`, so
/// closing means dropping the handle, exactly once.
struct ZkSession {
    hosts: String,
    zk: Option<ZooKeeper>,
}

impl ZkSession {
    fn handle(&self) -> DiscoveryResult<&ZooKeeper> {
        self.zk
            .as_ref()
            .ok_or_else(|| DiscoveryError::ensemble_unavailable(&self.hosts, "session closed"))
    }
}

impl CoordinationSession for ZkSession {
    fn get_children(&self, path: &str) -> DiscoveryResult<Vec<String>> {
        self.handle()?
            .get_children(path, false)
            .map_err(|e| {
                DiscoveryError::ensemble_unavailable(&self.hosts, format!("{:?} listing {}", e, path))
            })
    }

    fn get_data(&self, path: &str) -> DiscoveryResult<Vec<u8>> {
        self.handle()?
            .get_data(path, false)
            .map(|(data, _stat)| data)
            .map_err(|e| {
                DiscoveryError::ensemble_unavailable(&self.hosts, format!("{:?} reading {}", e, path))
            })
    }

    fn close(&mut self) -> DiscoveryResult<()> {
        if let Some(zk) = self.zk.take() {
            drop(zk);
        }
        Ok(())
    }
}
