//! Leader resolution
//!
//! Finding the current Mesos leader is delegated to a [`LeaderResolver`]
//! owned by the caller and injected into the fetcher. Each resolver turns
//! whatever its backend reports (refused connections, empty ensembles, HTTP
//! errors) into [`DiscoveryError::NoMasterAvailable`] at this boundary.
//!
//! Three strategies are provided, picked by [`MasterLocator::parse`]:
//! - [`StaticLeader`]: a fixed `http://host:port`
//! - [`RedirectLeaderResolver`]: ask candidate masters where `/master/redirect` points
//! - [`CoordinationLeaderResolver`]: read the lowest `json.info_*` entry in the ensemble

use crate::config::ClusterConfig;
use crate::coordination::CoordinationClient;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::metadata::parse_zk_url;
use crate::state::EnsembleConfig;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Message carried by `NoMasterAvailable` when every candidate failed
pub const NO_MASTER_MESSAGE: &str = "unable to connect to a master";

/// Prefix of the JSON registration entries masters write into the ensemble
pub const JSON_INFO_PREFIX: &str = "json.info_";

/// Resolves the base URL (`http://host:port`) of the current leader
#[cfg_attr(test, mockall::automock)]
pub trait LeaderResolver: Send + Sync {
    fn leader_url(&self) -> DiscoveryResult<String>;
}

/// Where to look for the leader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasterLocator {
    /// Fixed leader URL
    Static(String),
    /// Candidate masters as `host:port`
    Candidates(Vec<String>),
    /// Coordination ensemble the masters register in
    Coordination(EnsembleConfig),
}

impl MasterLocator {
    /// Parse `zk://hosts/path`, `http(s)://host:port`, or `host[:port][,host[:port]...]`.
    ///
    /// Hosts without a port get `default_port`.
    pub fn parse(locator: &str, default_port: u16) -> DiscoveryResult<Self> {
        let locator = locator.trim();
        if locator.is_empty() {
            return Err(DiscoveryError::Config("master locator is empty".into()));
        }

        if locator.starts_with("zk://") {
            let ensemble = parse_zk_url(locator)
                .map_err(|e| DiscoveryError::Config(format!("master locator: {}", e)))?;
            return Ok(Self::Coordination(ensemble));
        }

        if locator.starts_with("http://") || locator.starts_with("https://") {
            return Ok(Self::Static(locator.trim_end_matches('/').to_string()));
        }

        let candidates: Vec<String> = locator
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(|h| {
                if h.contains(':') {
                    h.to_string()
                } else {
                    format!("{}:{}", h, default_port)
                }
            })
            .collect();

        if candidates.is_empty() {
            return Err(DiscoveryError::Config(format!(
                "no master hosts in locator {:?}",
                locator
            )));
        }
        Ok(Self::Candidates(candidates))
    }

    /// Build the resolver for this locator.
    ///
    /// `Coordination` locators use `coordination` when given, otherwise a
    /// ZooKeeper client when the `zookeeper` feature is enabled.
    pub fn into_resolver(
        self,
        config: &ClusterConfig,
        coordination: Option<CoordinationClient>,
    ) -> DiscoveryResult<Arc<dyn LeaderResolver>> {
        match self {
            Self::Static(url) => Ok(Arc::new(StaticLeader::new(url))),
            Self::Candidates(hosts) => Ok(Arc::new(RedirectLeaderResolver::new(
                hosts,
                config.request_timeout(),
            )?)),
            Self::Coordination(ensemble) => {
                let client = match coordination {
                    Some(client) => client,
                    None => default_coordination_client(config)?,
                };
                Ok(Arc::new(CoordinationLeaderResolver::new(client, ensemble)))
            }
        }
    }
}

#[cfg(feature = "zookeeper")]
fn default_coordination_client(config: &ClusterConfig) -> DiscoveryResult<CoordinationClient> {
    Ok(CoordinationClient::zookeeper(config.coordination_timeout()))
}

#[cfg(not(feature = "zookeeper"))]
fn default_coordination_client(_config: &ClusterConfig) -> DiscoveryResult<CoordinationClient> {
    Err(DiscoveryError::Config(
        "zk:// master locators need the `zookeeper` feature or an injected coordination client"
            .into(),
    ))
}

/// Leader at a fixed, known URL
#[derive(Debug, Clone)]
pub struct StaticLeader {
    url: String,
}

impl StaticLeader {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl LeaderResolver for StaticLeader {
    fn leader_url(&self) -> DiscoveryResult<String> {
        Ok(self.url.clone())
    }
}

/// Asks each candidate master for `/master/redirect` and follows the
/// `Location` it answers with. The first candidate that answers wins.
#[derive(Debug, Clone)]
pub struct RedirectLeaderResolver {
    candidates: Vec<String>,
    http: reqwest::blocking::Client,
}

impl RedirectLeaderResolver {
    pub fn new(candidates: Vec<String>, timeout: Duration) -> DiscoveryResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| DiscoveryError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { candidates, http })
    }

    fn ask(&self, candidate: &str) -> Result<String, String> {
        let url = format!("http://{}/master/redirect", candidate);
        let resp = self.http.get(&url).send().map_err(|e| e.to_string())?;

        let status = resp.status();
        if !status.is_redirection() {
            return Err(format!("expected a redirect, got HTTP {}", status));
        }

        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| "redirect without Location header".to_string())?;

        leader_base_url(location).ok_or_else(|| format!("unusable Location {:?}", location))
    }
}

impl LeaderResolver for RedirectLeaderResolver {
    fn leader_url(&self) -> DiscoveryResult<String> {
        for candidate in &self.candidates {
            match self.ask(candidate) {
                Ok(leader) => {
                    tracing::debug!("Master {} points at leader {}", candidate, leader);
                    return Ok(leader);
                }
                Err(e) => {
                    tracing::warn!("Master candidate {} did not resolve a leader: {}", candidate, e);
                }
            }
        }
        Err(DiscoveryError::NoMasterAvailable(NO_MASTER_MESSAGE.into()))
    }
}

/// Reduce a redirect target (`//host:5050`, `http://host:5050/master`) to
/// `scheme://host:port`
fn leader_base_url(location: &str) -> Option<String> {
    let (scheme, rest) = if let Some(rest) = location.strip_prefix("https://") {
        ("https", rest)
    } else if let Some(rest) = location.strip_prefix("http://") {
        ("http", rest)
    } else if let Some(rest) = location.strip_prefix("//") {
        ("http", rest)
    } else {
        return None;
    };

    let authority = rest.split('/').next().unwrap_or_default();
    if authority.is_empty() {
        return None;
    }
    Some(format!("{}://{}", scheme, authority))
}

/// Leader registration written by a master into the ensemble
#[derive(Debug, Deserialize)]
struct MasterInfo {
    #[serde(default)]
    address: Option<MasterAddress>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct MasterAddress {
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    port: Option<u16>,
}

impl MasterInfo {
    fn base_url(&self) -> Option<String> {
        let address = self.address.as_ref();
        let host = address
            .and_then(|a| a.hostname.clone().or_else(|| a.ip.clone()))
            .or_else(|| self.hostname.clone())
            .filter(|h| !h.is_empty())?;
        let port = address.and_then(|a| a.port).or(self.port)?;
        Some(format!("http://{}:{}", host, port))
    }
}

/// Reads the leader from the coordination ensemble.
///
/// Masters contend by creating sequential `json.info_*` entries; the lowest
/// sequence number is the leader.
#[derive(Debug, Clone)]
pub struct CoordinationLeaderResolver {
    client: CoordinationClient,
    ensemble: EnsembleConfig,
}

impl CoordinationLeaderResolver {
    pub fn new(client: CoordinationClient, ensemble: EnsembleConfig) -> Self {
        Self { client, ensemble }
    }

    fn resolve(&self) -> DiscoveryResult<String> {
        let root = self.ensemble.absolute_path();

        self.client.with_session(&self.ensemble.hosts, |session| {
            let children = session.get_children(&root)?;
            let leader_entry = lowest_json_info(&children).ok_or_else(|| {
                DiscoveryError::NoMasterAvailable(format!(
                    "{}: no {}* entries under {}",
                    NO_MASTER_MESSAGE, JSON_INFO_PREFIX, root
                ))
            })?;

            let entry_path = format!("{}/{}", root.trim_end_matches('/'), leader_entry);
            let data = session.get_data(&entry_path)?;
            let info: MasterInfo = serde_json::from_slice(&data).map_err(|e| {
                DiscoveryError::NoMasterAvailable(format!(
                    "{}: unreadable leader entry {}: {}",
                    NO_MASTER_MESSAGE, entry_path, e
                ))
            })?;

            info.base_url().ok_or_else(|| {
                DiscoveryError::NoMasterAvailable(format!(
                    "{}: leader entry {} has no address",
                    NO_MASTER_MESSAGE, entry_path
                ))
            })
        })
    }
}

impl LeaderResolver for CoordinationLeaderResolver {
    fn leader_url(&self) -> DiscoveryResult<String> {
        match self.resolve() {
            Ok(url) => {
                tracing::debug!("Ensemble {} names leader {}", self.ensemble.hosts, url);
                Ok(url)
            }
            Err(e @ DiscoveryError::NoMasterAvailable(_)) => Err(e),
            Err(e) => Err(DiscoveryError::NoMasterAvailable(format!(
                "{}: {}",
                NO_MASTER_MESSAGE, e
            ))),
        }
    }
}

/// Entry with the lowest sequence suffix among `json.info_<seq>` names
fn lowest_json_info(children: &[String]) -> Option<&str> {
    children
        .iter()
        .filter_map(|name| {
            let seq = name.strip_prefix(JSON_INFO_PREFIX)?.parse::<u64>().ok()?;
            Some((seq, name.as_str()))
        })
        .min_by_key(|(seq, _)| *seq)
        .map(|(_, name)| name)
}
