use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, trace};

use crate::cluster::{Cluster, Response, STATUS_OK};

// ============================================================================
// Errors
// ============================================================================

/// Failures talking to the cloud manager. None of these are retried.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("issue request error: {0}")]
    Http(String),

    #[error("fail to request {url}: status code {status}")]
    Status { url: String, status: u16 },

    #[error("fail to request: action {action} returned status code {status_code}: {message}")]
    Envelope {
        action: String,
        status_code: u16,
        message: String,
    },

    #[error("unmarshal error: {0}")]
    Decode(String),
}

// ============================================================================
// SBIO: Trait for abstraction (allows mocking in tests)
// ============================================================================

/// The fleet-management operations this tool needs
#[async_trait]
pub trait FleetApi: Send + Sync {
    /// List every cluster, or fetch the one named `name`
    async fn list_clusters(&self, name: Option<&str>) -> Result<Vec<Cluster>, TransportError>;

    async fn create_cluster(&self, cluster: &Cluster) -> Result<Response, TransportError>;

    async fn delete_cluster(&self, name: &str) -> Result<Response, TransportError>;
}

// ============================================================================
// SBIO: I/O implementation (real HTTP client)
// ============================================================================

/// HTTP client for the cloud manager's cluster collection
#[derive(Clone)]
pub struct CloudManagerClient {
    client: reqwest::Client,
    clusters_url: String,
}

impl CloudManagerClient {
    /// Create a client for the collection at `clusters_url`
    pub fn new(clusters_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            clusters_url: clusters_url.into(),
        }
    }

    pub fn clusters_url(&self) -> &str {
        &self.clusters_url
    }

    /// URL of a single cluster
    pub fn cluster_url(&self, name: &str) -> String {
        format!("{}/{}", self.clusters_url.trim_end_matches('/'), name)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<Response, TransportError> {
        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let url = resp.url().to_string();
        let status = resp.status().as_u16();
        if status != STATUS_OK {
            return Err(TransportError::Status { url, status });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let envelope = decode_envelope(&body)?;
        trace!("{} -> {}: {:?}", url, envelope.action, envelope.message);
        Ok(envelope)
    }
}

/// Decode a response body and reject any envelope that is not a success.
pub fn decode_envelope(body: &[u8]) -> Result<Response, TransportError> {
    let envelope: Response =
        serde_json::from_slice(body).map_err(|e| TransportError::Decode(e.to_string()))?;

    if !envelope.is_success() {
        return Err(TransportError::Envelope {
            action: envelope.action,
            status_code: envelope.status_code,
            message: envelope.message.unwrap_or_default(),
        });
    }

    Ok(envelope)
}

#[async_trait]
impl FleetApi for CloudManagerClient {
    async fn list_clusters(&self, name: Option<&str>) -> Result<Vec<Cluster>, TransportError> {
        let url = match name {
            Some(name) => self.cluster_url(name),
            None => self.clusters_url.clone(),
        };
        debug!("GET {}", url);
        let envelope = self.send(self.client.get(&url)).await?;
        Ok(envelope.payload.clusters)
    }

    async fn create_cluster(&self, cluster: &Cluster) -> Result<Response, TransportError> {
        debug!("POST {} ({})", self.clusters_url, cluster.name);
        self.send(self.client.post(&self.clusters_url).json(cluster))
            .await
    }

    async fn delete_cluster(&self, name: &str) -> Result<Response, TransportError> {
        let url = self.cluster_url(name);
        debug!("DELETE {}", url);
        self.send(self.client.delete(&url)).await
    }
}

// ============================================================================
// SBIO: Mock implementation for testing (no I/O)
// ============================================================================
