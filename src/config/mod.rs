//! Settings for talking to the cloud manager
//!
//! Settings are read once at startup from a YAML file (default
//! `~/.cmctl/config.yaml`), overridden by command-line flags, and then passed
//! by reference to every component. Every field has a default, so a missing
//! or partial file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Collection path of the cluster resource on the cloud manager
pub const DEFAULT_API_PATH: &str = "/pingcap.com/api/v1/clusters";

/// Default config file location: ~/.cmctl/config.yaml
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cmctl")
        .join("config.yaml")
}

/// Errors that can occur while loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("lack of cloud-manager-addr")]
    MissingCloudManagerAddr,

    #[error("Failed to load env file {path}: {message}")]
    EnvFile { path: PathBuf, message: String },
}

/// Which service addresses are excluded before probing the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeExclusion {
    /// Probe every published address
    None,
    /// Skip nodes that host gateway pods
    #[default]
    GatewayNodes,
    /// Skip nodes that host placement-driver or storage pods
    OtherTiers,
}

/// Policy applied when building a create request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecPolicy {
    /// Gateway replica floor; `None` disables it
    pub min_gateway_replicas: Option<i32>,
    /// Storage replica ceiling; `None` disables it
    pub max_storage_replicas: Option<i32>,
    pub tidb_lease: i32,
    pub monitor_reserve_days: i32,
    pub monitor_version: String,
    pub monitor_size: i32,
    /// Value paired with the node-affinity label key
    pub affinity_value: String,
}

impl Default for SpecPolicy {
    fn default() -> Self {
        Self {
            min_gateway_replicas: Some(2),
            max_storage_replicas: Some(4),
            tidb_lease: 5,
            monitor_reserve_days: 14,
            monitor_version: "4.2.0,v1.5.2,v0.3.1".to_string(),
            monitor_size: 1,
            affinity_value: "allow".to_string(),
        }
    }
}

/// Bounds for waiting on pods and the gateway service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval_secs: u64,
    /// Blind wait applied once after the cluster is structurally ready
    pub bootstrap_grace_secs: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            interval_secs: 10,
            bootstrap_grace_secs: 60,
        }
    }
}

impl PollPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn bootstrap_grace(&self) -> Duration {
        Duration::from_secs(self.bootstrap_grace_secs)
    }
}

/// Bounds and parameters for the SQL probe against the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbePolicy {
    pub max_attempts: u32,
    pub interval_secs: u64,
    pub connect_timeout_secs: u64,
    pub user: String,
    pub database: String,
    pub query: String,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            interval_secs: 5,
            connect_timeout_secs: 3,
            user: "root".to_string(),
            database: "mysql".to_string(),
            query: "SELECT count(*) FROM mysql.tidb".to_string(),
        }
    }
}

impl ProbePolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// The complete settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base address of the cloud manager (e.g., "http://10.0.0.1:8080")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_manager_addr: Option<String>,
    pub api_path: String,
    pub spec: SpecPolicy,
    pub poll: PollPolicy,
    pub probe: ProbePolicy,
    /// Delete the cluster when it never becomes reachable
    pub cleanup_on_timeout: bool,
    pub node_exclusion: NodeExclusion,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cloud_manager_addr: None,
            api_path: DEFAULT_API_PATH.to_string(),
            spec: SpecPolicy::default(),
            poll: PollPolicy::default(),
            probe: ProbePolicy::default(),
            cleanup_on_timeout: false,
            node_exclusion: NodeExclusion::default(),
        }
    }
}

impl Settings {
    /// URL of the cluster collection
    pub fn clusters_url(&self) -> Result<String, ConfigError> {
        let addr = self
            .cloud_manager_addr
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or(ConfigError::MissingCloudManagerAddr)?;
        Ok(format!("{}{}", addr.trim_end_matches('/'), self.api_path))
    }

    pub fn with_cloud_manager_addr(mut self, addr: impl Into<String>) -> Self {
        self.cloud_manager_addr = Some(addr.into());
        self
    }
}

// ============================================================================
// SBIO: Pure parsing (no I/O)
// ============================================================================

/// Parse settings from a YAML string
pub fn parse_settings(content: &str) -> Result<Settings, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

// ============================================================================
// I/O boundary functions
// ============================================================================

/// Load settings from the default location
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&default_config_path())
}

/// Load settings from a specific path, falling back to defaults if absent
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    parse_settings(&content)
}
