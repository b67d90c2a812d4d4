//! Wire types for the cloud manager API
//!
//! The cloud manager speaks in terms of its own tier names (`pd`, `tikv`,
//! `tidb`); the Rust side names them by role.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// The only status code treated as success, both on the HTTP status line
/// and inside the response envelope.
pub const STATUS_OK: u16 = 200;

/// Desired state of one pod group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodSpec {
    /// Desired replica count
    pub size: i32,
    /// Image version tag
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<ResourceRequirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceRequirement>,
    /// Node-affinity labels the pods must be scheduled on
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub node_selector: HashMap<String, String>,
}

/// Resource requirements for a pod
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirement {
    /// Cores a pod requires
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cpu: String,
    /// Memory a pod requires
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub memory: String,
    /// Storage size a pod requires
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub storage: String,
}

/// Decode an explicit `null` the same way as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Lifecycle phase reported for a pod
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    /// Anything else, including a phase the manager has not filled in yet
    #[default]
    #[serde(other)]
    Unknown,
}

/// One concrete pod as seen by the control plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodStatus {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pod_ip: String,
    #[serde(default)]
    pub node_ip: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: PodPhase,
}

impl PodStatus {
    pub fn is_running(&self) -> bool {
        self.status == PodPhase::Running
    }
}

/// How a pod group is reached from outside the cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// All node addresses exposing the node port
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub node_ip: Vec<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub node_port: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_ip: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub cluster_port: u16,
    /// Load balancer address
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub external_ip: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub external_port: u16,
}

impl Service {
    /// True once the control plane has published at least one address
    pub fn is_published(&self) -> bool {
        !self.node_ip.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        *self == Service::default()
    }
}

fn is_zero(port: &u16) -> bool {
    *port == 0
}

/// A cluster as submitted to, and returned by, the cloud manager
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Unique cluster name
    pub name: String,
    #[serde(rename = "pd", default)]
    pub placement_driver: Option<PodSpec>,
    #[serde(rename = "tikv", default)]
    pub storage: Option<PodSpec>,
    #[serde(rename = "tidb", default)]
    pub gateway: Option<PodSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor: Option<PodSpec>,
    /// Defaults to the manager's startup setting when empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_type: String,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub tidb_lease: i32,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub monitor_reserve_days: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub root_password: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,

    // Response-only fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub initialized: bool,
    #[serde(rename = "tidb_service", default, skip_serializing_if = "Service::is_empty")]
    pub gateway_service: Service,
    #[serde(default, skip_serializing_if = "Service::is_empty")]
    pub prometheus_service: Service,
    #[serde(default, skip_serializing_if = "Service::is_empty")]
    pub grafana_service: Service,
    #[serde(
        rename = "pd_status",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub placement_driver_status: Vec<PodStatus>,
    #[serde(
        rename = "tikv_status",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub storage_status: Vec<PodStatus>,
    #[serde(
        rename = "tidb_status",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub gateway_status: Vec<PodStatus>,
}

fn is_zero_i32(value: &i32) -> bool {
    *value == 0
}

/// Payload carried by every envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub clusters: Vec<Cluster>,
}

/// Uniform response envelope returned for every call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub action: String,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payload: Payload,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }
}
