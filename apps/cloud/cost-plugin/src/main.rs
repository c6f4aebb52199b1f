//! Cost Plugin
//!
//! Prices cloud resources for a single region: projected monthly cost,
//! actual cost over a window, billing metadata and cheaper-SKU
//! recommendations. Requests are JSON files (or `-` for stdin); results
//! are printed as JSON on stdout and logs go to stderr.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_costing::CostService;
use eyre::{Result, WrapErr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod commands;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "cost-plugin")]
#[command(about = "Estimate cloud resource costs for a single region")]
struct Cli {
    /// Print Prometheus metrics to stderr after the command
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Projected monthly cost of a resource
    Projected {
        /// Resource descriptor JSON file, or - for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },

    /// Actual cost of a resource over a time window
    Actual {
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Window start (RFC 3339). Falls back to the pulumi:created tag.
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Window end (RFC 3339). Defaults to now.
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },

    /// Billing metadata for a resource
    Spec {
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },

    /// Recommendations for a batch of resources
    Recommend {
        /// Recommendations request, or a JSON array of resource descriptors
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },

    /// Whether this instance can price a resource
    Supports {
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },

    /// Projected cost from a structured attribute document
    Estimate {
        /// Resource type, canonical (ec2) or vendor form (aws:ec2/instance:Instance)
        #[arg(short = 't', long = "type")]
        resource_type: String,

        /// Attribute document JSON file, or - for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let cli = Cli::parse();

    if cli.metrics {
        observability::init_metrics().wrap_err("Failed to install metrics recorder")?;
    }

    let pricing = config.load_pricing()?;
    let service = CostService::new(Arc::new(pricing), config.engine_settings());
    info!(region = %config.plugin.region, "Cost engine ready");

    match cli.command {
        Commands::Projected { input } => commands::projected(&service, &input)?,
        Commands::Actual { input, start, end } => commands::actual(&service, &input, start, end)?,
        Commands::Spec { input } => commands::spec(&service, &input)?,
        Commands::Recommend { input } => commands::recommend(&service, &input)?,
        Commands::Supports { input } => commands::supports(&service, &input)?,
        Commands::Estimate {
            resource_type,
            input,
        } => commands::estimate(&service, &resource_type, &input)?,
    }

    if cli.metrics {
        eprintln!("{}", observability::render_metrics());
    }

    Ok(())
}
