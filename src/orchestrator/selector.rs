//! Choosing which gateway addresses to probe

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cluster::{Cluster, PodStatus, Tier};
use crate::config::NodeExclusion;

/// Service addresses not in `excluded`, in their original order, without
/// duplicates. Empty when nothing is left to probe.
pub fn candidates(service: &[String], excluded: &[String]) -> Vec<String> {
    let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(service.len());

    service
        .iter()
        .filter(|addr| !excluded.contains(addr.as_str()))
        .filter(|addr| seen.insert(addr.as_str()))
        .cloned()
        .collect()
}

/// Node addresses to leave out of the candidate set under `policy`
pub fn excluded_addresses(cluster: &Cluster, policy: NodeExclusion) -> Vec<String> {
    let node_ips = |statuses: &[PodStatus]| -> Vec<String> {
        statuses
            .iter()
            .filter(|s| !s.node_ip.is_empty())
            .map(|s| s.node_ip.clone())
            .collect()
    };

    match policy {
        NodeExclusion::None => Vec::new(),
        NodeExclusion::GatewayNodes => node_ips(Tier::Gateway.statuses(cluster)),
        NodeExclusion::OtherTiers => {
            let mut addrs = node_ips(Tier::PlacementDriver.statuses(cluster));
            addrs.extend(node_ips(Tier::Storage.statuses(cluster)));
            addrs
        }
    }
}

// ============================================================================
// Selection strategies
// ============================================================================

/// Picks which candidate to probe next
pub trait NodePicker: Send {
    /// Index in `0..len`. Only called with `len > 0`.
    fn pick(&mut self, len: usize) -> usize;
}

/// Uniform choice with replacement
pub struct RandomPicker {
    rng: StdRng,
}

impl RandomPicker {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl NodePicker for RandomPicker {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Replays a fixed sequence of indices, cycling when exhausted
pub struct SequencePicker {
    indices: Vec<usize>,
    next: usize,
}

impl SequencePicker {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices, next: 0 }
    }
}

impl NodePicker for SequencePicker {
    fn pick(&mut self, len: usize) -> usize {
        if self.indices.is_empty() {
            return 0;
        }
        let index = self.indices[self.next % self.indices.len()];
        self.next += 1;
        index % len
    }
}
