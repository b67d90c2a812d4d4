//! # Readiness orchestration
//!
//! Turns "cluster accepted by the cloud manager" into "cluster is serving
//! SQL traffic":
//!
//! ```text
//! create ─▶ poller (pd ▶ tikv ▶ tidb ▶ service address) ─▶ bootstrap grace
//!        ─▶ selector (exclude occupied nodes) ─▶ prober (SQL query) ─▶ host:port
//! ```
//!
//! Both loops are bounded by attempt count with a fixed delay. Exhausting
//! either is fatal and, when `cleanup_on_timeout` is set, the cluster is
//! deleted on a best-effort basis.

pub mod poller;
pub mod prober;
pub mod selector;

pub use poller::{assess, wait_for_bootstrap, wait_for_cluster, Blocker, PollOutcome, PollState};
pub use prober::{probe_until_ready, ProbeOutcome};
pub use selector::{candidates, excluded_addresses, NodePicker, RandomPicker, SequencePicker};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::client::{FleetApi, TransportError};
use crate::cluster::Cluster;
use crate::config::Settings;
use crate::probe::SqlProbe;

#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("don't find cluster {0}")]
    ClusterNotFound(String),

    #[error("no tidb address left to probe")]
    NoCandidates,

    #[error("can't wait cluster {cluster}: {reason}")]
    Timeout { cluster: String, reason: String },
}

/// Where to reach a ready cluster
#[derive(Debug, Clone, PartialEq)]
pub struct AccessInfo {
    pub host: String,
    pub port: u16,
    /// Grafana node port on the same host, when the monitor tier exposes one
    pub grafana_port: Option<u16>,
}

/// Create `request` and wait until its gateway answers queries.
pub async fn provision(
    api: &dyn FleetApi,
    probe: &dyn SqlProbe,
    picker: &mut dyn NodePicker,
    settings: &Settings,
    request: &Cluster,
) -> Result<AccessInfo, OrchestrationError> {
    api.create_cluster(request).await?;
    info!("cluster {} accepted, waiting for pods", request.name);
    await_access(api, probe, picker, settings, &request.name).await
}

/// Wait for an already created cluster to become reachable.
pub async fn await_access(
    api: &dyn FleetApi,
    probe: &dyn SqlProbe,
    picker: &mut dyn NodePicker,
    settings: &Settings,
    name: &str,
) -> Result<AccessInfo, OrchestrationError> {
    let cluster = match wait_for_cluster(api, name, &settings.poll).await? {
        PollOutcome::Ready { cluster, .. } => cluster,
        PollOutcome::TimedOut { attempts, blocker } => {
            let reason = format!("still waiting on {} after {} attempts", blocker, attempts);
            return Err(fail(api, settings, name, reason).await);
        }
    };

    wait_for_bootstrap(name, &settings.poll).await;

    let excluded = excluded_addresses(&cluster, settings.node_exclusion);
    let nodes = candidates(&cluster.gateway_service.node_ip, &excluded);
    let port = cluster.gateway_service.node_port;
    info!("{}: probing tidb on {:?} port {}", name, nodes, port);

    match probe_until_ready(probe, &nodes, port, &settings.probe, picker).await? {
        ProbeOutcome::Reachable { host, attempts } => {
            info!("{}: tidb {}:{} reachable after {} probes", name, host, port, attempts);
            let grafana_port = Some(cluster.grafana_service.node_port).filter(|p| *p != 0);
            Ok(AccessInfo {
                host,
                port,
                grafana_port,
            })
        }
        ProbeOutcome::TimedOut {
            attempts,
            last_error,
        } => {
            let reason = match last_error {
                Some(e) => format!("tidb unreachable after {} probes, error {}", attempts, e),
                None => format!("tidb unreachable after {} probes", attempts),
            };
            Err(fail(api, settings, name, reason).await)
        }
    }
}

/// Build the timeout error, deleting the cluster first if configured to.
async fn fail(
    api: &dyn FleetApi,
    settings: &Settings,
    name: &str,
    reason: String,
) -> OrchestrationError {
    if settings.cleanup_on_timeout {
        warn!("deleting cluster {} after timeout", name);
        if let Err(e) = api.delete_cluster(name).await {
            error!("failed to delete cluster {}: {}", name, e);
        }
    }
    OrchestrationError::Timeout {
        cluster: name.to_string(),
        reason,
    }
}
