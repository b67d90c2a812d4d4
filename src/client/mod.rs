pub mod cloud_manager;

pub use cloud_manager::{decode_envelope, CloudManagerClient, FleetApi, TransportError};
