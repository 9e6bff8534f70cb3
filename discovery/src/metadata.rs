//! Cluster Metadata Extractor
//!
//! Typed facts pulled out of a leader state document: the configured quorum
//! size and the coordination ensemble the masters register in.

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::state::cluster::json_kind;
use crate::state::{ClusterState, EnsembleConfig};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// `zk://<hosts>/<path>`: hosts run up to the first `/`, path is the rest
static ZK_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^zk://([^/]*)/(.*)$").expect("ZK_URL_RE regex should compile"));

/// Configured quorum size from `flags.quorum`.
///
/// Masters report flags as strings, so `"3"`, `3` and `3.0` are all
/// accepted. Fractional or negative values are not.
pub fn quorum_size(state: &ClusterState) -> DiscoveryResult<u32> {
    let raw = state
        .flag("quorum")
        .ok_or_else(|| DiscoveryError::MalformedState("flags.quorum is missing".into()))?;

    let parsed = match raw {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(whole_number))
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| {
        DiscoveryError::MalformedState(format!(
            "flags.quorum is not a non-negative integer: {} {}",
            json_kind(raw),
            raw
        ))
    })
}

fn whole_number(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64).then_some(f as u64)
}

/// Coordination ensemble from `flags.zk`
pub fn ensemble_config(state: &ClusterState) -> DiscoveryResult<EnsembleConfig> {
    let zk = state
        .flag("zk")
        .ok_or_else(|| DiscoveryError::MalformedState("flags.zk is missing".into()))?
        .as_str()
        .ok_or_else(|| DiscoveryError::MalformedState("flags.zk is not a string".into()))?;

    parse_zk_url(zk)
}

/// Parse a `zk://hosts/path` connection string.
///
/// Fails without the `zk://` scheme, without a `/` after the hosts, or with
/// an empty path.
pub fn parse_zk_url(url: &str) -> DiscoveryResult<EnsembleConfig> {
    let caps = ZK_URL_RE.captures(url).ok_or_else(|| {
        DiscoveryError::MalformedState(format!("not a zk://hosts/path string: {:?}", url))
    })?;

    let hosts = &caps[1];
    let path = &caps[2];
    if path.is_empty() {
        return Err(DiscoveryError::MalformedState(format!(
            "zk connection string has no path: {:?}",
            url
        )));
    }

    Ok(EnsembleConfig::new(hosts, path))
}
