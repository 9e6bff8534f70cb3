//! Cluster State Fetcher
//!
//! Retrieves JSON snapshots over HTTP, either from the current leader (found
//! through the injected [`LeaderResolver`]) or from one agent at its
//! well-known port. The two paths fail differently:
//! - leader paths: `NoMasterAvailable` when the leader can't be resolved or reached
//! - agent paths: `AgentUnreachable` carrying the attempted URL and transport error
//!
//! Transport failures while reading a body count the same as failing to
//! connect. Both paths report non-2xx answers as `UpstreamUnavailable` and
//! unparseable bodies as `MalformedResponse`. Every request is bounded by a
//! timeout and nothing is retried.

use crate::aggregate;
use crate::config::ClusterConfig;
use crate::coordination::CoordinationClient;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::leader::{LeaderResolver, MasterLocator, NO_MASTER_MESSAGE};
use crate::state::{AttributeGrouping, ClusterState, TaskRecord};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Leader path of the metrics snapshot
pub const METRICS_SNAPSHOT_PATH: &str = "metrics/snapshot";

/// Path of the state document on masters and agents
pub const STATE_PATH: &str = "state.json";

/// HTTP client for leader and agent state
#[derive(Clone)]
pub struct ClusterStateFetcher {
    config: ClusterConfig,
    resolver: Arc<dyn LeaderResolver>,
    http: reqwest::blocking::Client,
}

impl ClusterStateFetcher {
    /// Create a fetcher around an explicit resolver
    pub fn new(config: ClusterConfig, resolver: Arc<dyn LeaderResolver>) -> DiscoveryResult<Self> {
        config.validate()?;

        let http = reqwest::blocking::Client::builder()
            .connect_timeout(config.request_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DiscoveryError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            resolver,
            http,
        })
    }

    /// Create a fetcher whose resolver is chosen from `config.master`
    pub fn from_config(
        config: ClusterConfig,
        coordination: Option<CoordinationClient>,
    ) -> DiscoveryResult<Self> {
        let resolver = MasterLocator::parse(&config.master, config.master_port)?
            .into_resolver(&config, coordination)?;
        Self::new(config, resolver)
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Flat metric-name → value snapshot from the leader
    pub fn fetch_leader_metrics(&self) -> DiscoveryResult<BTreeMap<String, f64>> {
        let body = self.get_from_leader(METRICS_SNAPSHOT_PATH)?;
        parse_json(&body.url, &body.text)
    }

    /// Full state document of the leader
    pub fn fetch_leader_state(&self) -> DiscoveryResult<ClusterState> {
        let body = self.get_from_leader(STATE_PATH)?;
        parse_state(&body.url, &body.text)
    }

    /// State of the agent on this machine.
    ///
    /// The host comes from `agent_host` in the config, falling back to the
    /// local hostname.
    pub fn fetch_local_agent_state(&self, timeout: Duration) -> DiscoveryResult<ClusterState> {
        let host = match &self.config.agent_host {
            Some(host) => host.clone(),
            None => local_hostname()?,
        };
        self.fetch_agent_state(&host, timeout)
    }

    /// State of the agent running on `host`
    pub fn fetch_agent_state(
        &self,
        host: &str,
        timeout: Duration,
    ) -> DiscoveryResult<ClusterState> {
        let url = format!("http://{}:{}/{}", host, self.config.agent_port, STATE_PATH);
        tracing::debug!("Fetching agent state from {}", url);

        let agent_unreachable = |source: reqwest::Error| DiscoveryError::AgentUnreachable {
            url: url.clone(),
            source,
        };

        let resp = self
            .http
            .get(&url)
            .timeout(timeout)
            .send()
            .map_err(agent_unreachable)?;
        let resp = check_status(&url, resp)?;
        let text = resp.text().map_err(agent_unreachable)?;

        parse_state(&url, &text)
    }

    /// Leader state grouped by an agent attribute
    pub fn agents_grouped_by_attribute(
        &self,
        attribute: &str,
    ) -> DiscoveryResult<AttributeGrouping> {
        let state = self.fetch_leader_state()?;
        Ok(aggregate::group_agents_by_attribute(&state, attribute))
    }

    /// Tasks of active frameworks on the leader whose id contains `job_id`
    pub fn current_tasks(&self, job_id: &str) -> DiscoveryResult<Vec<TaskRecord>> {
        let state = self.fetch_leader_state()?;
        Ok(aggregate::current_tasks(&state, job_id))
    }

    fn get_from_leader(&self, path: &str) -> DiscoveryResult<Body> {
        let leader = self.resolver.leader_url()?;
        let url = format!("{}/{}", leader.trim_end_matches('/'), path);
        tracing::debug!("Fetching {} from leader", url);

        let leader_lost = |e: reqwest::Error| {
            tracing::warn!("Leader request to {} failed: {}", url, e);
            DiscoveryError::NoMasterAvailable(format!("{}: {} ({})", NO_MASTER_MESSAGE, url, e))
        };

        let resp = self.http.get(&url).send().map_err(leader_lost)?;
        let resp = check_status(&url, resp)?;
        let text = resp.text().map_err(leader_lost)?;

        Ok(Body { url, text })
    }
}

impl std::fmt::Debug for ClusterStateFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterStateFetcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

struct Body {
    url: String,
    text: String,
}

fn check_status(
    url: &str,
    resp: reqwest::blocking::Response,
) -> DiscoveryResult<reqwest::blocking::Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        tracing::warn!("{} answered HTTP {}", url, status);
        Err(DiscoveryError::UpstreamUnavailable {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

fn parse_json<T: DeserializeOwned>(url: &str, text: &str) -> DiscoveryResult<T> {
    serde_json::from_str(text).map_err(|e| DiscoveryError::malformed_response(url, e))
}

fn parse_state(url: &str, text: &str) -> DiscoveryResult<ClusterState> {
    let value: Value = parse_json(url, text)?;
    ClusterState::from_value(value).map_err(|e| DiscoveryError::malformed_response(url, e))
}

/// Name of this machine as the operating system reports it
pub fn local_hostname() -> DiscoveryResult<String> {
    let name = hostname::get()
        .map_err(DiscoveryError::HostnameUnavailable)?
        .to_string_lossy()
        .trim()
        .to_string();

    if name.is_empty() {
        return Err(DiscoveryError::HostnameUnavailable(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "operating system reported an empty hostname",
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leader::MockLeaderResolver;

    fn fetcher_with(resolver: MockLeaderResolver) -> ClusterStateFetcher {
        let mut config = ClusterConfig::for_master("http://unused:5050");
        config.request_timeout_secs = 1;
        ClusterStateFetcher::new(config, Arc::new(resolver)).unwrap()
    }

    #[test]
    fn test_unresolvable_leader_fails_before_any_request() {
        let mut resolver = MockLeaderResolver::new();
        resolver
            .expect_leader_url()
            .times(2)
            .returning(|| Err(DiscoveryError::NoMasterAvailable(NO_MASTER_MESSAGE.into())));
        let fetcher = fetcher_with(resolver);

        assert!(matches!(
            fetcher.fetch_leader_state(),
            Err(DiscoveryError::NoMasterAvailable(_))
        ));
        assert!(matches!(
            fetcher.fetch_leader_metrics(),
            Err(DiscoveryError::NoMasterAvailable(_))
        ));
    }

    #[test]
    fn test_grouping_propagates_leader_loss() {
        let mut resolver = MockLeaderResolver::new();
        resolver
            .expect_leader_url()
            .returning(|| Err(DiscoveryError::NoMasterAvailable(NO_MASTER_MESSAGE.into())));
        let fetcher = fetcher_with(resolver);

        assert!(fetcher.agents_grouped_by_attribute("rack").is_err());
        assert!(fetcher.current_tasks("svc.main").is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ClusterConfig::default();
        config.agent_port = 0;
        let err =
            ClusterStateFetcher::new(config, Arc::new(MockLeaderResolver::new())).unwrap_err();
        assert!(matches!(err, DiscoveryError::Config(_)));
    }

    #[test]
    fn test_parse_state_rejects_non_object() {
        let err = parse_state("http://a:5051/state.json", "[1,2,3]").unwrap_err();
        assert!(matches!(err, DiscoveryError::MalformedResponse { .. }));
        let err = parse_state("http://a:5051/state.json", "<html>").unwrap_err();
        assert!(matches!(err, DiscoveryError::MalformedResponse { .. }));
    }

    #[test]
    fn test_parse_metrics_requires_numbers() {
        let ok: BTreeMap<String, f64> =
            parse_json("u", r#"{"master/elected": 1.0, "master/slaves_active": 12}"#).unwrap();
        assert_eq!(ok["master/slaves_active"], 12.0);

        let bad: DiscoveryResult<BTreeMap<String, f64>> =
            parse_json("u", r#"{"master/elected": "yes"}"#);
        assert!(matches!(bad, Err(DiscoveryError::MalformedResponse { .. })));
    }

    #[test]
    fn test_local_hostname_matches_system() {
        let name = local_hostname().unwrap();
        assert!(!name.is_empty());
        assert_eq!(name, hostname::get().unwrap().to_string_lossy().trim());
    }

    #[test]
    fn test_local_agent_url_uses_system_hostname() {
        let mut resolver = MockLeaderResolver::new();
        resolver.expect_leader_url().never();
        let mut config = ClusterConfig::for_master("http://unused:5050");
        config.agent_port = 1;
        let fetcher = ClusterStateFetcher::new(config, Arc::new(resolver)).unwrap();

        match fetcher.fetch_local_agent_state(Duration::from_millis(200)) {
            Err(DiscoveryError::AgentUnreachable { url, .. }) => {
                let expected = format!("http://{}:1/state.json", local_hostname().unwrap());
                assert_eq!(url, expected);
            }
            other => panic!("expected AgentUnreachable, got {:?}", other),
        }
    }
}
