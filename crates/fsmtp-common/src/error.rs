//! Error types for FSMTP provisioning

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level error for a provisioning run
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Mint(#[from] MintError),
}

/// Result type alias for FSMTP provisioning
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::Provision(e) => e.code(),
            Error::Mint(e) => e.code(),
        }
    }
}

/// Failures of the schema provisioner.
///
/// Every variant is terminal: execution stops at the failing point and
/// nothing is rolled back.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// No host reachable, or the cluster rejected the credentials
    #[error("Connection to cluster [{hosts}] failed: {reason}")]
    Connection { hosts: String, reason: String },

    /// The store rejected a single statement
    #[error("Statement #{index} rejected: {reason}\n{statement}")]
    Statement {
        index: usize,
        statement: String,
        reason: String,
    },

    /// A statement did not complete within the per-statement timeout
    #[error("Statement #{index} timed out after {timeout:?}\n{statement}")]
    Timeout {
        index: usize,
        statement: String,
        timeout: Duration,
    },
}

impl ProvisionError {
    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            ProvisionError::Connection { .. } => "CONNECTION_ERROR",
            ProvisionError::Statement { .. } => "STATEMENT_ERROR",
            ProvisionError::Timeout { .. } => "TIMEOUT",
        }
    }

    /// Timeouts are reported as a kind of connection failure
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            ProvisionError::Connection { .. } | ProvisionError::Timeout { .. }
        )
    }

    /// Index of the statement that caused the failure, if any
    pub fn statement_index(&self) -> Option<usize> {
        match self {
            ProvisionError::Connection { .. } => None,
            ProvisionError::Statement { index, .. } | ProvisionError::Timeout { index, .. } => {
                Some(*index)
            }
        }
    }
}

/// Failures of the certificate minter
#[derive(Error, Debug)]
pub enum MintError {
    #[error("Invalid certificate subject: {0}")]
    InvalidSubject(String),

    #[error("Key generation failed: {0}")]
    KeyGen(String),

    #[error("Certificate signing failed: {0}")]
    Signing(String),

    #[error("Failed to write {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MintError {
    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            MintError::InvalidSubject(_) => "INVALID_SUBJECT",
            MintError::KeyGen(_) => "KEYGEN_ERROR",
            MintError::Signing(_) => "SIGNING_ERROR",
            MintError::Persistence { .. } => "PERSISTENCE_ERROR",
        }
    }
}
