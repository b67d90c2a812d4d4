//! Tier readiness checks
//!
//! Pure functions over a fetched cluster snapshot. Missing or partial data
//! always means "not ready yet", never an error.

use std::fmt;

use super::types::{Cluster, PodSpec, PodStatus};

/// One of the pod groups making up a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    PlacementDriver,
    Storage,
    Gateway,
    Monitor,
}

impl Tier {
    /// Tiers that must be running before the gateway is probed, in the
    /// order they are expected to come up.
    pub const ORDERED: [Tier; 3] = [Tier::PlacementDriver, Tier::Storage, Tier::Gateway];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::PlacementDriver => "pd",
            Tier::Storage => "tikv",
            Tier::Gateway => "tidb",
            Tier::Monitor => "monitor",
        }
    }

    pub fn spec<'a>(&self, cluster: &'a Cluster) -> Option<&'a PodSpec> {
        match self {
            Tier::PlacementDriver => cluster.placement_driver.as_ref(),
            Tier::Storage => cluster.storage.as_ref(),
            Tier::Gateway => cluster.gateway.as_ref(),
            Tier::Monitor => cluster.monitor.as_ref(),
        }
    }

    /// Pod statuses reported for this tier. The monitor tier has none.
    pub fn statuses<'a>(&self, cluster: &'a Cluster) -> &'a [PodStatus] {
        match self {
            Tier::PlacementDriver => &cluster.placement_driver_status,
            Tier::Storage => &cluster.storage_status,
            Tier::Gateway => &cluster.gateway_status,
            Tier::Monitor => &[],
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of pods in the `Running` phase
pub fn running_count(statuses: &[PodStatus]) -> usize {
    statuses.iter().filter(|s| s.is_running()).count()
}

/// A pod group is up once at least `desired` of its pods are running.
pub fn is_group_ready(statuses: &[PodStatus], desired: i32) -> bool {
    if desired <= 0 {
        return true;
    }
    running_count(statuses) >= desired as usize
}

/// First tier in [`Tier::ORDERED`] that is not ready, if any.
///
/// A tier whose spec is absent from the snapshot counts as not ready.
pub fn first_unready_tier(cluster: &Cluster) -> Option<Tier> {
    Tier::ORDERED.into_iter().find(|tier| match tier.spec(cluster) {
        Some(spec) => !is_group_ready(tier.statuses(cluster), spec.size),
        None => true,
    })
}
