//! FSMTP Common - Shared types and configuration
//!
//! This crate provides the configuration model, the error taxonomy and
//! the value types shared by the schema provisioner, the certificate
//! minter and the `fsmtp-provision` binary.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, MintError, ProvisionError, Result};
pub use types::{CertificateSubject, ConnectionCredentials};
