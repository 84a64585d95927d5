use crate::adapters::outgoing::kraft_admin::KraftClusterAdmin;
use crate::application::topic_service::TopicResolutionService;
use crate::domain::ClusterId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const DEFAULT_PROTOCOL_TIMEOUT_MS: u64 = 5000;
const DEFAULT_CLUSTER_ID: &str = "local";
const DEFAULT_LOG_DIR: &str = "/tmp/kraft-combined-logs";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file {path}: {source}")]
    ConfigFileError {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to deserialize config {path}")]
    TomlError {
        path: String,
        source: toml::de::Error,
    },
    #[error("No clusters configured")]
    NoClusters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Broker log directory holding `__cluster_metadata-0`.
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_protocol_timeout_ms")]
    pub protocol_timeout_ms: u64,
    #[serde(default)]
    pub clusters: BTreeMap<ClusterId, ClusterConfig>,
}

fn default_protocol_timeout_ms() -> u64 {
    DEFAULT_PROTOCOL_TIMEOUT_MS
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut clusters = BTreeMap::new();
        clusters.insert(
            ClusterId::from(DEFAULT_CLUSTER_ID),
            ClusterConfig {
                log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            },
        );
        Self {
            protocol_timeout_ms: DEFAULT_PROTOCOL_TIMEOUT_MS,
            clusters,
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading config");
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigFileError {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    fn parse(content: &str, path: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content).map_err(|source| ConfigError::TomlError {
            path: path.to_string(),
            source,
        })?;
        if config.clusters.is_empty() {
            return Err(ConfigError::NoClusters);
        }
        Ok(config)
    }

    pub fn protocol_timeout(&self) -> Duration {
        Duration::from_millis(self.protocol_timeout_ms)
    }

    pub fn build_admin(&self) -> KraftClusterAdmin {
        let clusters = self
            .clusters
            .iter()
            .map(|(id, cluster)| (id.clone(), cluster.log_dir.clone()))
            .collect();
        KraftClusterAdmin::new(clusters, self.protocol_timeout())
    }

    pub fn build_service(&self) -> TopicResolutionService {
        TopicResolutionService::new(Arc::new(self.build_admin()))
    }
}
