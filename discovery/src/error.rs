//! Discovery error types
//!
//! Every network or parsing failure in this crate surfaces as one
//! [`DiscoveryError`] value. Nothing is retried internally; callers decide
//! whether to retry, degrade, or abort using [`DiscoveryError::is_retryable`].

use thiserror::Error;

/// Result type alias for discovery operations
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Errors that can occur while discovering and querying the cluster
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// The current leader could not be resolved or reached
    #[error("No master available: {0}")]
    NoMasterAvailable(String),

    /// A reachable endpoint answered with a non-success status
    #[error("Upstream {url} returned HTTP {status}")]
    UpstreamUnavailable { url: String, status: u16 },

    /// Connection-level failure reaching a specific agent
    #[error(
        "Could not connect to the mesos agent at {url}. Is the mesos-slave running? Error was: {source}"
    )]
    AgentUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response body did not match the expected shape
    #[error("Malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    /// State document is missing a field or has the wrong type
    #[error("Malformed cluster state: {0}")]
    MalformedState(String),

    /// This machine's hostname could not be determined
    #[error("Could not determine the local hostname: {0}")]
    HostnameUnavailable(#[source] std::io::Error),

    /// Coordination ensemble connection or listing failed
    #[error("Coordination ensemble {hosts} unavailable: {reason}")]
    EnsembleUnavailable { hosts: String, reason: String },

    /// Configuration could not be loaded or is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DiscoveryError {
    /// Whether a later attempt could plausibly succeed.
    ///
    /// Malformed data and bad configuration signal a protocol or version
    /// mismatch and stay broken until something changes on either side.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NoMasterAvailable(_)
                | Self::UpstreamUnavailable { .. }
                | Self::AgentUnreachable { .. }
                | Self::EnsembleUnavailable { .. }
        )
    }

    pub(crate) fn malformed_response(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::MalformedResponse {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    #[cfg_attr(not(feature = "zookeeper"), allow(dead_code))]
    pub(crate) fn ensemble_unavailable(hosts: &str, reason: impl std::fmt::Display) -> Self {
        Self::EnsembleUnavailable {
            hosts: hosts.to_string(),
            reason: reason.to_string(),
        }
    }
}
