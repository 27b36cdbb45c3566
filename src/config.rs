//! YAML configuration
//!
//! ```yaml
//! failure_policy: run_to_completion
//! request_timeout_secs: 30
//! explain:
//!   replication_mode: ROW
//! clusters:
//!   - id: c1
//!     name: production
//!     topology_file: topologies/c1.yaml
//!   - id: c2
//!     topology:
//!       keyspaces: [{ name: commerce }]
//! ```

use crate::error::{FedAdminError, Result};
use fedadmin_server::{
    ApiOptions, ClusterSet, ExplainOptions, FailurePolicy, FixtureClient, RequestContext,
    Topology,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub clusters: Vec<ClusterConfig>,
    pub failure_policy: FailurePolicy,
    pub request_timeout_secs: Option<u64>,
    pub explain: ExplainOptions,

    /// Directory that relative `topology_file` paths are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<Topology>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology_file: Option<PathBuf>,
}

impl ClusterConfig {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| FedAdminError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_yaml(&text).map_err(|e| FedAdminError::ParseFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        config.validate()?;
        debug!(path = %path.display(), clusters = config.clusters.len(), "configuration loaded");

        Ok(config)
    }

    /// Parse without validating; relative topology files resolve against the
    /// working directory
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.clusters.is_empty() {
            return Err(FedAdminError::ConfigError("no clusters configured".to_string()));
        }

        let mut seen = HashSet::new();
        for cluster in &self.clusters {
            if cluster.id.trim().is_empty() {
                return Err(FedAdminError::ConfigError("cluster id must not be empty".to_string()));
            }
            if !seen.insert(cluster.id.as_str()) {
                return Err(FedAdminError::ConfigError(format!(
                    "duplicate cluster id: {}",
                    cluster.id
                )));
            }
            match (&cluster.topology, &cluster.topology_file) {
                (Some(_), Some(_)) => {
                    return Err(FedAdminError::ConfigError(format!(
                        "cluster {}: set either topology or topology_file, not both",
                        cluster.id
                    )))
                }
                (None, None) => {
                    return Err(FedAdminError::ConfigError(format!(
                        "cluster {}: one of topology or topology_file is required",
                        cluster.id
                    )))
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Build the cluster set, reading any topology files
    pub fn build_clusters(&self) -> Result<ClusterSet> {
        let mut clusters = Vec::with_capacity(self.clusters.len());

        for cluster in &self.clusters {
            let topology = match (&cluster.topology, &cluster.topology_file) {
                (Some(topology), _) => topology.clone(),
                (None, Some(file)) => load_topology(&self.base_dir.join(file))?,
                (None, None) => {
                    return Err(FedAdminError::ConfigError(format!(
                        "cluster {}: no topology",
                        cluster.id
                    )))
                }
            };

            debug!(
                cluster = %cluster.id,
                keyspaces = topology.keyspaces.len(),
                tablets = topology.tablets.len(),
                "cluster configured"
            );

            clusters.push(
                FixtureClient::new(topology).into_cluster(cluster.id.clone(), cluster.display_name()),
            );
        }

        Ok(ClusterSet::new(clusters)?)
    }

    pub fn api_options(&self) -> ApiOptions {
        ApiOptions {
            failure_policy: self.failure_policy,
            explain: self.explain.clone(),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn request_context(&self) -> RequestContext {
        match self.request_timeout() {
            Some(timeout) => RequestContext::with_timeout(timeout),
            None => RequestContext::new(),
        }
    }
}

/// `.json` files are read as JSON, anything else as YAML
fn load_topology(path: &Path) -> Result<Topology> {
    let text = std::fs::read_to_string(path).map_err(|source| FedAdminError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&text).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&text).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| FedAdminError::ParseFailed {
        path: path.to_path_buf(),
        message,
    })
}
