//! FSMTP provisioning entry point
//!
//! Creates the mail server's keyspace and tables and mints its
//! self-signed TLS certificate.

mod steps;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fsmtp_common::config::{Config, LoggingConfig};
use fsmtp_schema::{fsmtp_schema, render_script, ClusterConnector};
use std::path::{Path, PathBuf};
use steps::{plan, script_options, Orchestrator, Selection, StepOutcome};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "fsmtp-provision", version, about = "Provision the FSMTP mail server")]
struct Cli {
    /// Configuration file (json, toml or yaml)
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Provision the schema, then mint the certificate
    All,
    /// Create the keyspace and tables
    Schema {
        /// Print the CQL script instead of executing it; works without a config file
        #[arg(long)]
        print: bool,
    },
    /// Mint the self-signed certificate and key
    Cert,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let selection = match cli.command.unwrap_or(Command::All) {
        Command::Schema { print: true } => return print_script(cli.config.as_deref()),
        Command::All => Selection::All,
        Command::Schema { print: false } => Selection::Schema,
        Command::Cert => Selection::Certificate,
    };

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Initialize logging
    init_logging(&config.logging);

    let steps = plan(selection);
    info!(steps = ?steps, "Starting FSMTP provisioning");

    let connector = ClusterConnector::new(config.database.connect_timeout());
    let outcomes = Orchestrator::new(&config, connector).run(&steps).await?;

    for outcome in &outcomes {
        match outcome {
            StepOutcome::Schema(report) => info!(
                executed = report.executed,
                non_idempotent = report.non_idempotent,
                "Schema ready"
            ),
            StepOutcome::Certificate(minted) => info!(
                cert = %minted.cert_path.display(),
                key = %minted.key_path.display(),
                expires = %minted.not_after,
                "Certificate ready"
            ),
        }
    }

    info!("FSMTP provisioning complete");

    Ok(())
}

fn print_script(config: Option<&Path>) -> Result<()> {
    let options = script_options(Config::locate(config).as_deref())?;
    print!("{}", render_script(&fsmtp_schema(&options)));
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_target(true).with_level(true))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}
