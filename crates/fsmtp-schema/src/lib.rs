//! FSMTP Schema - Keyspace and table provisioning
//!
//! This crate holds the ordered CQL statement list for the mail server's
//! `fannst` keyspace and the provisioner that applies it over a single
//! cluster session.

pub mod db;
pub mod provisioner;
pub mod statement;

pub use db::{ClusterConnector, ClusterSession, SchemaConnector, SchemaSession};
pub use provisioner::{provision_schema, ProvisionReport, SchemaProvisioner};
pub use statement::{fsmtp_schema, render_script, Idempotence, SchemaOptions, SchemaStatement};
