//! Resolved job identity handed in by the configuration layer.
//!
//! Loading and merging service configuration happens elsewhere; this crate
//! only uses the identity to address tasks in cluster state.

use serde::{Deserialize, Serialize};

/// Separator between service and instance in a job id
pub const JOB_ID_SPACER: &str = ".";

/// A fully resolved job configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub service: String,
    pub instance: String,
    pub cluster: String,
    #[serde(default = "default_cpus")]
    pub cpus: f64,
    #[serde(default = "default_mem")]
    pub mem: f64,
    #[serde(default = "default_disk")]
    pub disk: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<String>,
}

fn default_cpus() -> f64 {
    1.0
}

fn default_mem() -> f64 {
    1024.0
}

fn default_disk() -> f64 {
    1024.0
}

impl JobConfig {
    pub fn new(
        service: impl Into<String>,
        instance: impl Into<String>,
        cluster: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            instance: instance.into(),
            cluster: cluster.into(),
            cpus: default_cpus(),
            mem: default_mem(),
            disk: default_disk(),
            deploy_group: None,
            docker_image: None,
        }
    }

    /// `service.instance`, the prefix Mesos task ids carry for this job
    pub fn job_id(&self) -> String {
        format!("{}{}{}", self.service, JOB_ID_SPACER, self.instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id() {
        let job = JobConfig::new("example_service", "main", "norcal-devc");
        assert_eq!(job.job_id(), "example_service.main");
    }

    #[test]
    fn test_deserialize_applies_resource_defaults() {
        let job: JobConfig = serde_json::from_str(
            r#"{"service": "svc", "instance": "interactive", "cluster": "c1", "mem": 2048}"#,
        )
        .unwrap();
        assert_eq!(job.cpus, 1.0);
        assert_eq!(job.mem, 2048.0);
        assert_eq!(job.disk, 1024.0);
        assert!(job.deploy_group.is_none());
    }
}
