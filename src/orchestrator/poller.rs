//! Waiting for a freshly created cluster to be scheduled
//!
//! Each attempt fetches a fresh snapshot, checks the tiers in order
//! (placement driver, storage, gateway) and then whether the gateway service
//! has published an address. The previous snapshot is discarded every time.

use std::fmt;

use tokio::time::sleep;
use tracing::{debug, info};

use super::OrchestrationError;
use crate::client::FleetApi;
use crate::cluster::{first_unready_tier, Cluster, Tier};
use crate::config::PollPolicy;

/// Where an attempt got to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Fetching,
    EvaluatingTiers,
    WaitingForEndpoint,
    Ready,
    TimedOut,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PollState::Fetching => "fetching",
            PollState::EvaluatingTiers => "evaluating tiers",
            PollState::WaitingForEndpoint => "waiting for endpoint",
            PollState::Ready => "ready",
            PollState::TimedOut => "timed out",
        };
        f.write_str(s)
    }
}

/// What the cluster is still waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    Tier(Tier),
    Endpoint,
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Blocker::Tier(tier) => write!(f, "{} pods", tier),
            Blocker::Endpoint => f.write_str("tidb service address"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Ready { cluster: Cluster, attempts: u32 },
    TimedOut { attempts: u32, blocker: Blocker },
}

/// Check one snapshot. `None` means the cluster is structurally ready.
pub fn assess(cluster: &Cluster) -> Option<Blocker> {
    if let Some(tier) = first_unready_tier(cluster) {
        return Some(Blocker::Tier(tier));
    }
    if !cluster.gateway_service.is_published() {
        return Some(Blocker::Endpoint);
    }
    None
}

/// Poll until every tier is running and the gateway service has an address.
///
/// Makes at most `policy.max_attempts` fetches, sleeping `policy.interval()`
/// between them. A fetch that returns no cluster is fatal: the cluster was
/// never created.
pub async fn wait_for_cluster(
    api: &dyn FleetApi,
    name: &str,
    policy: &PollPolicy,
) -> Result<PollOutcome, OrchestrationError> {
    let mut blocker = Blocker::Tier(Tier::PlacementDriver);

    for attempt in 1..=policy.max_attempts {
        let mut state = PollState::Fetching;
        debug!("{}: attempt {}/{} {}", name, attempt, policy.max_attempts, state);

        let mut clusters = api.list_clusters(Some(name)).await?;
        if clusters.is_empty() {
            return Err(OrchestrationError::ClusterNotFound(name.to_string()));
        }
        let cluster = clusters.swap_remove(0);

        state = PollState::EvaluatingTiers;
        let Some(pending) = assess(&cluster) else {
            info!("{}: {} after {} attempts", name, PollState::Ready, attempt);
            return Ok(PollOutcome::Ready {
                cluster,
                attempts: attempt,
            });
        };
        if pending == Blocker::Endpoint {
            state = PollState::WaitingForEndpoint;
        }
        blocker = pending;
        debug!("{}: {}, waiting on {}", name, state, blocker);

        if attempt < policy.max_attempts {
            sleep(policy.interval()).await;
        }
    }

    info!("{}: {} waiting on {}", name, PollState::TimedOut, blocker);
    Ok(PollOutcome::TimedOut {
        attempts: policy.max_attempts,
        blocker,
    })
}

/// Blind wait for the database's own bootstrap once pods are up.
///
/// Nothing is polled here; the grace period is a fixed sleep.
pub async fn wait_for_bootstrap(name: &str, policy: &PollPolicy) {
    let grace = policy.bootstrap_grace();
    if grace.is_zero() {
        return;
    }
    info!("{}: waiting {:?} for bootstrap", name, grace);
    sleep(grace).await;
}
