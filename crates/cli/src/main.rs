//! Kubediag CLI
//!
//! Finds the pods of one application deployment, classifies their health
//! and explains why the unhealthy ones are failing.

mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use diag_lib::{Driver, KubeconfigConnector, NullReporter, RuleMode};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Kubernetes pod diagnostics
#[derive(Debug, Parser)]
#[command(name = "kubediag")]
#[command(author, version, about = "Diagnose unhealthy pods of a Kubernetes deployment", long_about = None)]
pub struct Cli {
    /// Value of the 'app' label of the target pods
    #[arg(long)]
    pub app: String,

    /// Value of the 'country' label of the target pods
    #[arg(long)]
    pub country: String,

    /// Value of the 'fleet' label of the target pods
    #[arg(long)]
    pub fleet: Option<String>,

    /// Namespace to search [default: default]
    #[arg(long, short)]
    pub namespace: Option<String>,

    /// Path to kubeconfig file (uses ~/.kube/config if not specified)
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Cluster the active context must point at [default: staging]
    #[arg(long)]
    pub expected_cluster: Option<String>,

    /// Behaviour when no rule matches (terminal, escalating)
    #[arg(long, value_name = "MODE")]
    pub rule_mode: Option<RuleMode>,

    /// Previous-run log lines fetched per terminated container [default: 50]
    #[arg(long, value_name = "N")]
    pub log_tail_lines: Option<i64>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, value_name = "URL")]
    pub llm_endpoint: Option<String>,

    /// Model used for generative diagnosis
    #[arg(long, value_name = "MODEL")]
    pub llm_model: Option<String>,

    /// API key for the generative backend
    #[arg(long, env = "KUBEDIAG_LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Settings file (defaults to ~/.config/kubediag/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Omit the events and logs printed under each unhealthy pod
    #[arg(long)]
    pub summary_only: bool,

    /// Log format on standard error
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = config::Settings::load(cli.config.as_deref())?;
    let config = config::resolve(&cli, settings)?;
    config.validate().context("Invalid configuration")?;
    debug!(?config, "Resolved configuration");

    let connector = KubeconfigConnector::new(config.kubeconfig.clone());
    let mut driver = Driver::from_config(&config)?;

    match cli.format {
        output::OutputFormat::Table => {
            let mut reporter = output::TableReporter::new(!cli.summary_only);
            driver.run(&connector, &mut reporter).await?;
        }
        output::OutputFormat::Json => {
            let summary = driver.run(&connector, &mut NullReporter).await?;
            output::print_json(&summary)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose, cli.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
