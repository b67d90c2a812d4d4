//! Building create-cluster requests from user intent

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use super::types::{Cluster, PodSpec};
use crate::config::SpecPolicy;

/// A create request is missing a required value
#[derive(Error, Debug, PartialEq)]
pub enum SpecError {
    #[error("lack of {0}")]
    Missing(&'static str),
}

/// Requested size and version of one tier
#[derive(Debug, Clone, PartialEq)]
pub struct TierIntent {
    pub version: String,
    pub size: i32,
}

impl TierIntent {
    pub fn new(version: impl Into<String>, size: i32) -> Self {
        Self {
            version: version.into(),
            size,
        }
    }
}

/// Everything the user asked for in a create command
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterIntent {
    pub name: String,
    pub placement_driver: TierIntent,
    pub storage: TierIntent,
    pub gateway: TierIntent,
    /// Attach the monitoring tier
    pub monitor: bool,
    /// Node-affinity label key applied to every tier
    pub affinity_label: Option<String>,
}

impl ClusterIntent {
    /// Check required fields, reporting the first one missing.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.name.is_empty() {
            return Err(SpecError::Missing("cluster name"));
        }
        if self.gateway.version.is_empty() {
            return Err(SpecError::Missing("tidb version"));
        }
        if self.storage.version.is_empty() {
            return Err(SpecError::Missing("tikv version"));
        }
        if self.placement_driver.version.is_empty() {
            return Err(SpecError::Missing("pd version"));
        }
        Ok(())
    }
}

/// Build the create-cluster payload after applying replica floors and ceilings.
pub fn build_cluster_request(
    intent: &ClusterIntent,
    policy: &SpecPolicy,
) -> Result<Cluster, SpecError> {
    intent.validate()?;

    let node_selector: HashMap<String, String> = intent
        .affinity_label
        .as_deref()
        .filter(|label| !label.is_empty())
        .map(|label| HashMap::from([(label.to_string(), policy.affinity_value.clone())]))
        .unwrap_or_default();

    let mut gateway_size = intent.gateway.size;
    if let Some(min) = policy.min_gateway_replicas {
        gateway_size = gateway_size.max(min);
    }

    let mut storage_size = intent.storage.size;
    if let Some(max) = policy.max_storage_replicas {
        storage_size = storage_size.min(max);
    }

    if gateway_size != intent.gateway.size || storage_size != intent.storage.size {
        debug!(
            "Adjusted replica counts: tidb {} -> {}, tikv {} -> {}",
            intent.gateway.size, gateway_size, intent.storage.size, storage_size
        );
    }

    let pod_spec = |version: &str, size: i32| PodSpec {
        size,
        version: version.to_string(),
        node_selector: node_selector.clone(),
        ..Default::default()
    };

    Ok(Cluster {
        name: intent.name.clone(),
        placement_driver: Some(pod_spec(
            &intent.placement_driver.version,
            intent.placement_driver.size,
        )),
        storage: Some(pod_spec(&intent.storage.version, storage_size)),
        gateway: Some(pod_spec(&intent.gateway.version, gateway_size)),
        monitor: intent
            .monitor
            .then(|| pod_spec(&policy.monitor_version, policy.monitor_size)),
        tidb_lease: policy.tidb_lease,
        monitor_reserve_days: policy.monitor_reserve_days,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_intent() -> ClusterIntent {
        ClusterIntent {
            name: "demo".to_string(),
            placement_driver: TierIntent::new("v1.0.0", 1),
            storage: TierIntent::new("v1.0.0", 3),
            gateway: TierIntent::new("v1.0.0", 2),
            monitor: false,
            affinity_label: None,
        }
    }

    #[test]
    fn test_build_demo_cluster() {
        let cluster = build_cluster_request(&demo_intent(), &SpecPolicy::default()).unwrap();
        assert_eq!(cluster.name, "demo");
        assert_eq!(cluster.placement_driver.as_ref().unwrap().size, 1);
        assert_eq!(cluster.storage.as_ref().unwrap().size, 3);
        assert_eq!(cluster.gateway.as_ref().unwrap().size, 2);
        assert!(cluster.monitor.is_none());
        assert!(cluster.gateway.as_ref().unwrap().node_selector.is_empty());
        assert_eq!(cluster.tidb_lease, 5);
        assert_eq!(cluster.monitor_reserve_days, 14);
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let mut intent = demo_intent();
        intent.name.clear();
        intent.storage.version.clear();
        assert_eq!(intent.validate(), Err(SpecError::Missing("cluster name")));

        let mut intent = demo_intent();
        intent.gateway.version.clear();
        intent.placement_driver.version.clear();
        assert_eq!(
            build_cluster_request(&intent, &SpecPolicy::default()),
            Err(SpecError::Missing("tidb version"))
        );

        let mut intent = demo_intent();
        intent.storage.version.clear();
        assert_eq!(intent.validate(), Err(SpecError::Missing("tikv version")));

        let mut intent = demo_intent();
        intent.placement_driver.version.clear();
        assert_eq!(intent.validate(), Err(SpecError::Missing("pd version")));
    }

    #[test]
    fn test_replica_policy_applied() {
        let mut intent = demo_intent();
        intent.gateway.size = 1;
        intent.storage.size = 5;
        let cluster = build_cluster_request(&intent, &SpecPolicy::default()).unwrap();
        assert_eq!(cluster.gateway.unwrap().size, 2);
        assert_eq!(cluster.storage.unwrap().size, 4);
    }

    #[test]
    fn test_replica_policy_disabled() {
        let mut intent = demo_intent();
        intent.gateway.size = 1;
        intent.storage.size = 7;
        let policy = SpecPolicy {
            min_gateway_replicas: None,
            max_storage_replicas: None,
            ..Default::default()
        };
        let cluster = build_cluster_request(&intent, &policy).unwrap();
        assert_eq!(cluster.gateway.unwrap().size, 1);
        assert_eq!(cluster.storage.unwrap().size, 7);
    }

    #[test]
    fn test_affinity_label_on_every_tier() {
        let mut intent = demo_intent();
        intent.affinity_label = Some("stability".to_string());
        intent.monitor = true;
        let cluster = build_cluster_request(&intent, &SpecPolicy::default()).unwrap();

        for spec in [
            cluster.placement_driver.as_ref(),
            cluster.storage.as_ref(),
            cluster.gateway.as_ref(),
            cluster.monitor.as_ref(),
        ] {
            let spec = spec.unwrap();
            assert_eq!(spec.node_selector.get("stability").map(String::as_str), Some("allow"));
        }
        let monitor = cluster.monitor.unwrap();
        assert_eq!(monitor.version, "4.2.0,v1.5.2,v0.3.1");
        assert_eq!(monitor.size, 1);
    }
}
