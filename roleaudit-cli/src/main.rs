//! `roleaudit`: role access profile reports for a ServiceNow instance.
//!
//! Connection settings come from `SERVICENOW_*` environment variables; the
//! role and output format from flags or `ROLEAUDIT_*` variables. Logs go to
//! stderr so stdout carries only the report.

#![forbid(unsafe_code)]

mod run;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roleaudit_client::{InstanceConfig, TableApiClient};
use roleaudit_report::OutputFormat;

use crate::run::{run, RunOptions};

/// Role access profile report
#[derive(Parser, Debug)]
#[command(
    name = "roleaudit",
    version,
    about = "Report the roles, ACLs and tables reachable from a ServiceNow role"
)]
struct Cli {
    /// Role to report on
    #[arg(long, env = "ROLEAUDIT_ROLE", default_value = "adt_user")]
    role: String,

    /// Output format: console, html, csv or all
    #[arg(long, env = "ROLEAUDIT_FORMAT", default_value = "html")]
    format: OutputFormat,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roleaudit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = InstanceConfig::from_env();
    debug!(instance = %config.instance_url, "Loaded instance configuration");

    let options = RunOptions {
        role: cli.role,
        format: cli.format,
        instance_url: config.instance_url.clone(),
        generated_at: chrono::Utc::now(),
    };
    let client = TableApiClient::new(config).context("invalid instance configuration")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&options, &client, &client, &mut out).await
}
