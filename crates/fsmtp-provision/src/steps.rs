//! Ordered provisioning steps and the runner that executes them

use fsmtp_certs::{CertificateMinter, MintOptions, MintedCertificate};
use fsmtp_common::{Config, Error, MintError, Result};
use fsmtp_schema::{fsmtp_schema, ProvisionReport, SchemaConnector, SchemaOptions, SchemaProvisioner};
use std::path::Path;
use tracing::{error, info};

/// One unit of provisioning work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    /// Create the keyspace and tables, then seed `local_domain`
    Schema,
    /// Mint the self-signed certificate and key
    Certificate,
}

impl ProvisionStep {
    pub fn name(&self) -> &'static str {
        match self {
            ProvisionStep::Schema => "schema",
            ProvisionStep::Certificate => "certificate",
        }
    }
}

/// Which steps a run should include
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    Schema,
    Certificate,
}

/// The ordered step list for a selection
pub fn plan(selection: Selection) -> Vec<ProvisionStep> {
    match selection {
        Selection::All => vec![ProvisionStep::Schema, ProvisionStep::Certificate],
        Selection::Schema => vec![ProvisionStep::Schema],
        Selection::Certificate => vec![ProvisionStep::Certificate],
    }
}

/// What a finished step produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Schema(ProvisionReport),
    Certificate(MintedCertificate),
}

/// Schema options from configuration
pub fn schema_options(config: &Config) -> SchemaOptions {
    SchemaOptions {
        replication_factor: config.schema.replication_factor,
        seed_domain: config.schema.seed_domain().map(str::to_string),
    }
}

/// Options for `schema --print`.
///
/// Printing never connects, so without a configuration file the built-in
/// defaults are rendered.
pub fn script_options(located: Option<&Path>) -> Result<SchemaOptions> {
    match located {
        Some(path) => Ok(schema_options(&Config::from_file(path)?)),
        None => Ok(SchemaOptions::default()),
    }
}

/// Runs steps in order against one configuration
pub struct Orchestrator<'a, C> {
    config: &'a Config,
    connector: C,
}

impl<'a, C: SchemaConnector> Orchestrator<'a, C> {
    pub fn new(config: &'a Config, connector: C) -> Self {
        Self { config, connector }
    }

    /// Execute `steps` sequentially, stopping at the first failure
    pub async fn run(&self, steps: &[ProvisionStep]) -> Result<Vec<StepOutcome>> {
        let mut outcomes = Vec::with_capacity(steps.len());

        for (position, step) in steps.iter().enumerate() {
            info!(step = step.name(), position, total = steps.len(), "Starting step");

            match self.run_step(*step).await {
                Ok(outcome) => {
                    info!(step = step.name(), "Step completed");
                    outcomes.push(outcome);
                }
                Err(e) => {
                    error!(step = step.name(), code = e.code(), error = %e, "Step failed");
                    return Err(e);
                }
            }
        }

        Ok(outcomes)
    }

    async fn run_step(&self, step: ProvisionStep) -> Result<StepOutcome> {
        match step {
            ProvisionStep::Schema => self.provision_schema().await.map(StepOutcome::Schema),
            ProvisionStep::Certificate => self.mint_certificate().map(StepOutcome::Certificate),
        }
    }

    async fn provision_schema(&self) -> Result<ProvisionReport> {
        let credentials = self.config.database.credentials()?;
        let statements = fsmtp_schema(&schema_options(self.config));

        let report = SchemaProvisioner::new(&self.connector)
            .with_statement_timeout(self.config.database.statement_timeout())
            .provision(&credentials, &statements)
            .await?;

        Ok(report)
    }

    fn mint_certificate(&self) -> Result<MintedCertificate> {
        let cert = &self.config.certificate;

        ensure_parent(&cert.cert_out)?;
        ensure_parent(&cert.key_out)?;

        let minted = CertificateMinter::new(MintOptions {
            key_bits: cert.key_bits,
        })
        .mint(&cert.subject(), &cert.cert_out, &cert.key_out)?;

        info!(
            not_before = %minted.not_before,
            not_after = %minted.not_after,
            "Certificate minted"
        );

        Ok(minted)
    }
}

/// Create the key output directory, as the installer did before minting
fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| {
                Error::Mint(MintError::Persistence {
                    path: parent.to_path_buf(),
                    source,
                })
            })
        }
        _ => Ok(()),
    }
}
