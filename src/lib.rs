//! cmctl: create, query and delete database clusters through a cloud manager,
//! and wait for new clusters to serve SQL traffic.

pub mod cli;
pub mod client;
pub mod cluster;
pub mod config;
pub mod orchestrator;
pub mod probe;
