//! Cluster Optimizer CLI
//!
//! A command-line tool for bringing compute clusters in line with an
//! idle-shutdown, autoscaling and naming policy.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{inspect, optimize};
use optimizer_lib::{HttpDirectory, PolicySettings, WorkspaceContext};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Cluster Optimizer CLI
#[derive(Parser)]
#[command(name = "clusteropt")]
#[command(author, version, about = "Enforce cost policy across compute clusters", long_about = None)]
pub struct Cli {
    /// Workspace host (can also be set via DATABRICKS_HOST env var)
    #[arg(long, env = "DATABRICKS_HOST")]
    pub host: Option<String>,

    /// Principal whose clusters scope 'mine' selects
    #[arg(long, env = "DATABRICKS_USER")]
    pub principal: Option<String>,

    /// Settings file (defaults to ~/.config/clusteropt/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Log line format
    #[arg(long, default_value = "text")]
    pub log_format: output::LogFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize every cluster in scope and report or apply the changes
    Optimize {
        #[command(flatten)]
        policy: PolicyArgs,

        /// Write run metrics in Prometheus text format to this file
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },

    /// Show the desired configuration and changes for one cluster
    Inspect {
        /// Cluster ID to inspect
        cluster_id: String,

        #[command(flatten)]
        policy: PolicyArgs,
    },
}

/// Policy overrides; unset values fall back to settings
#[derive(clap::Args)]
pub struct PolicyArgs {
    /// Clusters to consider (all, mine)
    #[arg(long)]
    pub clusters: Option<String>,

    /// What to do with differences (view, update)
    #[arg(long)]
    pub action: Option<String>,

    /// Rebuild display names to the naming convention (on, off)
    #[arg(long)]
    pub rename: Option<String>,

    /// Idle-shutdown timeout in minutes (10-120)
    #[arg(long, allow_negative_numbers = true)]
    pub idle_time: Option<i64>,
}

impl PolicyArgs {
    fn apply(self, mut settings: PolicySettings) -> PolicySettings {
        if let Some(clusters) = self.clusters {
            settings.clusters = clusters;
        }
        if let Some(action) = self.action {
            settings.action = action;
        }
        if let Some(rename) = self.rename {
            settings.rename = rename;
        }
        if let Some(idle_time) = self.idle_time {
            settings.idle_time = idle_time;
        }
        settings
    }
}

fn init_tracing(verbose: bool, format: output::LogFormat) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        output::LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        output::LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let settings = config::Settings::load(cli.config.as_deref())?;
    let host = cli.host.or(settings.host).unwrap_or_default();
    let principal = cli.principal.or(settings.principal);
    let context = WorkspaceContext::new(&host, principal, config::api_token())?;
    tracing::info!(host = %context.host(), "Workspace configured");

    match cli.command {
        Commands::Optimize {
            policy,
            metrics_file,
        } => {
            let policy = policy.apply(settings.policy);
            optimize::run(
                context,
                &policy,
                metrics_file.as_deref(),
                cli.verbose,
                cli.format,
            )
            .await?;
        }
        Commands::Inspect { cluster_id, policy } => {
            let policy = policy.apply(settings.policy);
            let directory = HttpDirectory::new(context)?;
            inspect::show_plan(directory, &policy, &cluster_id, cli.format).await?;
        }
    }

    Ok(())
}
