//! Cluster resources as the cloud manager models them
//!
//! - [`types`]: wire types (`Cluster`, `PodSpec`, `PodStatus`, `Service`, the
//!   response envelope)
//! - [`spec`]: turning user intent into a create request
//! - [`readiness`]: deciding whether each tier is up

pub mod readiness;
pub mod spec;
pub mod types;

pub use readiness::{first_unready_tier, is_group_ready, running_count, Tier};
pub use spec::{build_cluster_request, ClusterIntent, SpecError, TierIntent};
pub use types::{
    Cluster, Payload, PodPhase, PodSpec, PodStatus, ResourceRequirement, Response, Service,
    STATUS_OK,
};
