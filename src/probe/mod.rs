//! Application-level health probe against the gateway's SQL port
//!
//! A probe opens one connection, runs one trivial read-only query and closes
//! the connection. Any failure means "not ready yet".

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use thiserror::Error;
use tokio::time::timeout;
use tracing::trace;

use crate::config::ProbePolicy;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    #[error("connection error: {0}")]
    Connect(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Checks whether a gateway address accepts real client connections
#[async_trait]
pub trait SqlProbe: Send + Sync {
    async fn probe(&self, host: &str, port: u16) -> Result<(), ProbeError>;
}

/// Probe speaking the MySQL wire protocol
#[derive(Debug, Clone)]
pub struct MySqlProbe {
    user: String,
    database: String,
    query: String,
    timeout: Duration,
}

impl MySqlProbe {
    pub fn new(policy: &ProbePolicy) -> Self {
        Self {
            user: policy.user.clone(),
            database: policy.database.clone(),
            query: policy.query.clone(),
            timeout: policy.connect_timeout(),
        }
    }

    fn connect_options(&self, host: &str, port: u16) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(&self.user)
            .database(&self.database)
            .charset("utf8")
    }

    async fn run(&self, host: &str, port: u16) -> Result<(), ProbeError> {
        let options = self.connect_options(host, port);
        let mut conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| ProbeError::Connect(e.to_string()))?;

        let result = sqlx::query(&self.query)
            .fetch_optional(&mut conn)
            .await
            .map_err(|e| ProbeError::Query(e.to_string()));

        // Closing can fail on a half-open connection; the query result decides.
        if let Err(e) = conn.close().await {
            trace!("closing probe connection to {}:{}: {}", host, port, e);
        }

        result.map(|_| ())
    }
}

#[async_trait]
impl SqlProbe for MySqlProbe {
    async fn probe(&self, host: &str, port: u16) -> Result<(), ProbeError> {
        timeout(self.timeout, self.run(host, port))
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))?
    }
}
