//! Connection configuration
//!
//! Built by the caller and handed to [`crate::fetcher::ClusterStateFetcher`]
//! and [`crate::census::MasterCensus`]. Nothing here is read from the process
//! environment unless the caller asks for it via [`ClusterConfig::from_env`].

use crate::error::{DiscoveryError, DiscoveryResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default port the Mesos master listens on
pub const MESOS_MASTER_PORT: u16 = 5050;

/// Default port the Mesos agent listens on
pub const MESOS_AGENT_PORT: u16 = 5051;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Cluster connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Master locator: `zk://hosts/path`, `host:port[,host:port...]`, or an
    /// `http://` URL of a fixed leader
    pub master: String,
    /// Host of the local agent; resolved from the OS when absent
    pub agent_host: Option<String>,
    /// Port of every agent's HTTP endpoint
    pub agent_port: u16,
    /// Port assumed for masters given without one
    pub master_port: u16,
    /// Bound on leader state/metrics requests
    pub request_timeout_secs: u64,
    /// Bound on agent state requests
    pub agent_timeout_secs: u64,
    /// Bound on coordination-ensemble connects
    pub coordination_timeout_secs: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            master: format!("localhost:{}", MESOS_MASTER_PORT),
            agent_host: None,
            agent_port: MESOS_AGENT_PORT,
            master_port: MESOS_MASTER_PORT,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            agent_timeout_secs: DEFAULT_TIMEOUT_SECS,
            coordination_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClusterConfig {
    /// Config pointing at the given master locator, defaults elsewhere
    pub fn for_master(master: impl Into<String>) -> Self {
        Self {
            master: master.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> DiscoveryResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| DiscoveryError::Config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file from disk
    pub fn load(path: impl AsRef<Path>) -> DiscoveryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DiscoveryError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded cluster config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by `MESOS_DISCOVERY_*` variables.
    ///
    /// Only consulted when called; unparseable values are ignored with a warning.
    pub fn from_env() -> DiscoveryResult<Self> {
        let mut config = Self::default();

        if let Ok(master) = std::env::var("MESOS_DISCOVERY_MASTER") {
            if !master.is_empty() {
                config.master = master;
            }
        }
        config.agent_host = std::env::var("MESOS_DISCOVERY_AGENT_HOST")
            .ok()
            .filter(|s| !s.is_empty());

        if let Some(port) = env_parse("MESOS_DISCOVERY_AGENT_PORT") {
            config.agent_port = port;
        }
        if let Some(port) = env_parse("MESOS_DISCOVERY_MASTER_PORT") {
            config.master_port = port;
        }
        if let Some(secs) = env_parse("MESOS_DISCOVERY_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = secs;
        }
        if let Some(secs) = env_parse("MESOS_DISCOVERY_AGENT_TIMEOUT_SECS") {
            config.agent_timeout_secs = secs;
        }
        if let Some(secs) = env_parse("MESOS_DISCOVERY_COORDINATION_TIMEOUT_SECS") {
            config.coordination_timeout_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every call fail or block forever
    pub fn validate(&self) -> DiscoveryResult<()> {
        if self.master.trim().is_empty() {
            return Err(DiscoveryError::Config("master locator is empty".into()));
        }
        if self.agent_port == 0 || self.master_port == 0 {
            return Err(DiscoveryError::Config("ports must be non-zero".into()));
        }
        if self.request_timeout_secs == 0
            || self.agent_timeout_secs == 0
            || self.coordination_timeout_secs == 0
        {
            return Err(DiscoveryError::Config("timeouts must be non-zero".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs)
    }

    pub fn coordination_timeout(&self) -> Duration {
        Duration::from_secs(self.coordination_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}={:?}", key, raw);
            None
        }
    }
}
