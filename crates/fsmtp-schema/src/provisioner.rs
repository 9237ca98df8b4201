//! Ordered, halt-on-first-error schema provisioning

use crate::db::{ClusterConnector, SchemaConnector, SchemaSession};
use crate::statement::SchemaStatement;
use fsmtp_common::{ConnectionCredentials, ProvisionError};
use std::time::Duration;
use tracing::{info, warn};

/// Default bound on a single statement
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a successful provisioning run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Statements executed, in order
    pub executed: usize,

    /// Of those, statements that append data on every run
    pub non_idempotent: usize,
}

/// Applies statement lists over a single session
pub struct SchemaProvisioner<C> {
    connector: C,
    statement_timeout: Duration,
}

impl<C: SchemaConnector> SchemaProvisioner<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
        }
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Connect once and execute `statements` in declaration order.
    ///
    /// Stops at the first rejected or timed out statement. Statements that
    /// already ran are not rolled back and later ones are not attempted.
    pub async fn provision(
        &self,
        credentials: &ConnectionCredentials,
        statements: &[SchemaStatement],
    ) -> Result<ProvisionReport, ProvisionError> {
        if credentials.hosts.is_empty() {
            return Err(ProvisionError::Connection {
                hosts: String::new(),
                reason: "no hosts configured".to_string(),
            });
        }

        let session = self.connector.connect(credentials).await?;
        let mut report = ProvisionReport {
            executed: 0,
            non_idempotent: 0,
        };

        for (index, statement) in statements.iter().enumerate() {
            info!(
                index,
                label = statement.label(),
                statement = %statement.text(),
                "Executing schema statement"
            );

            if !statement.is_idempotent() {
                warn!(
                    index,
                    label = statement.label(),
                    "Statement is not idempotent, re-running duplicates its rows"
                );
            }

            self.execute_one(&session, index, statement).await?;

            report.executed += 1;
            if !statement.is_idempotent() {
                report.non_idempotent += 1;
            }
        }

        info!(
            executed = report.executed,
            non_idempotent = report.non_idempotent,
            "Schema provisioning completed"
        );

        Ok(report)
    }

    async fn execute_one(
        &self,
        session: &C::Session,
        index: usize,
        statement: &SchemaStatement,
    ) -> Result<(), ProvisionError> {
        match tokio::time::timeout(self.statement_timeout, session.execute(statement.text())).await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ProvisionError::Statement {
                index,
                statement: statement.text().to_string(),
                reason: format!("{:#}", e),
            }),
            Err(_) => Err(ProvisionError::Timeout {
                index,
                statement: statement.text().to_string(),
                timeout: self.statement_timeout,
            }),
        }
    }
}

/// Provision `statements` against the cluster with default timeouts
pub async fn provision_schema(
    credentials: &ConnectionCredentials,
    statements: &[SchemaStatement],
) -> Result<ProvisionReport, ProvisionError> {
    SchemaProvisioner::new(ClusterConnector::default())
        .provision(credentials, statements)
        .await
}
