//! Cluster connection and session management

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use fsmtp_common::{ConnectionCredentials, ProvisionError};
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use std::time::Duration;
use tracing::{debug, info};

/// An open session that runs one statement at a time
#[async_trait]
pub trait SchemaSession: Send + Sync {
    /// Execute a single CQL statement without bound values
    async fn execute(&self, statement: &str) -> Result<()>;
}

/// Opens sessions against a cluster.
///
/// The returned session is owned by the caller and released when dropped.
#[async_trait]
pub trait SchemaConnector: Send + Sync {
    type Session: SchemaSession;

    async fn connect(
        &self,
        credentials: &ConnectionCredentials,
    ) -> std::result::Result<Self::Session, ProvisionError>;
}

#[async_trait]
impl<T: SchemaConnector> SchemaConnector for &T {
    type Session = T::Session;

    async fn connect(
        &self,
        credentials: &ConnectionCredentials,
    ) -> std::result::Result<Self::Session, ProvisionError> {
        (**self).connect(credentials).await
    }
}

/// Connector for Cassandra and ScyllaDB over the CQL native protocol
#[derive(Debug, Clone)]
pub struct ClusterConnector {
    connect_timeout: Duration,
}

impl ClusterConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for ClusterConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl SchemaConnector for ClusterConnector {
    type Session = ClusterSession;

    async fn connect(
        &self,
        credentials: &ConnectionCredentials,
    ) -> std::result::Result<ClusterSession, ProvisionError> {
        let hosts = credentials.hosts.join(",");
        let refused = |reason: String| ProvisionError::Connection {
            hosts: hosts.clone(),
            reason,
        };

        if credentials.hosts.is_empty() {
            return Err(refused("no hosts configured".to_string()));
        }

        let mut builder = SessionBuilder::new()
            .known_nodes(credentials.contact_points())
            .connection_timeout(self.connect_timeout);

        match credentials.auth() {
            Some((username, password)) => {
                debug!(username = %username, "Using plaintext authentication");
                builder = builder.user(username, password);
            }
            None => debug!("Connecting without authentication"),
        }

        info!(
            hosts = %hosts,
            port = credentials.port,
            "Connecting to cluster"
        );

        let session = tokio::time::timeout(self.connect_timeout, builder.build())
            .await
            .map_err(|_| refused(format!("timed out after {:?}", self.connect_timeout)))?
            .map_err(|e| refused(e.to_string()))?;

        info!("Cluster connection established");

        Ok(ClusterSession { session })
    }
}

/// Session wrapper around the driver session
pub struct ClusterSession {
    session: Session,
}

impl ClusterSession {
    /// Get the underlying driver session
    pub fn session(&self) -> &Session {
        &self.session
    }
}

#[async_trait]
impl SchemaSession for ClusterSession {
    async fn execute(&self, statement: &str) -> Result<()> {
        self.session
            .query_unpaged(statement, ())
            .await
            .map_err(|e| anyhow!("{}", e))?;
        Ok(())
    }
}
