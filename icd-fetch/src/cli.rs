///
/// This module implements the CLI interface for icd-fetch: argument parsing and
/// the async [`run`] entrypoint shared by `main` and the integration tests.
///
/// All traversal, persistence and API logic lives in the [`icd-fetch-core`] crate.
/// This module only resolves configuration, sets up logging and drives the traversal.
///
/// [`icd-fetch-core`]: ../../icd-fetch-core/
use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use icd_fetch_core::client::IcdClient;
use icd_fetch_core::config::parse_delay;
use icd_fetch_core::store::FileStore;
use icd_fetch_core::traverse::{Traversal, TraversalReport};
use std::path::PathBuf;
use std::time::Duration;

use crate::load_config::load_config;
use crate::logging;

/// Fetch and save ICD-10 data from the WHO API, one JSON file per code.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "icd-fetch", version, about, long_about = None)]
pub struct Cli {
    /// Bearer token for API authentication
    #[arg(long)]
    pub token: Option<String>,

    /// Directory to save the JSON files [default: icd_data]
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Delay between API requests in seconds [default: 0.5]
    #[arg(long, value_name = "SECONDS", value_parser = parse_delay)]
    pub delay: Option<Duration>,

    /// Log file path [default: icd_api.log]
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// INI config file with a [DEFAULT] section. May hold `client_id` and
    /// `client_secret` instead of a token.
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Base URL of the ICD release API
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Accept-Language sent to the API [default: en]
    #[arg(long)]
    pub language: Option<String>,

    /// Code to start from [default: the release root]. An empty value
    /// (`--root ""`) selects the release root and overrides the config file.
    #[arg(long, value_name = "CODE")]
    pub root: Option<String>,
}

/// Async CLI entrypoint for integration tests and main().
///
/// Fails only on startup errors; per-node failures are logged and counted in the report.
pub async fn run(cli: Cli) -> Result<TraversalReport> {
    let resolved = load_config(&cli)?;
    logging::init(&resolved.log_file);
    tracing::info!("Starting ICD-10 data collection");

    let config = resolved.into_effective().await?;
    config.trace_loaded();

    let client = IcdClient::from_config(&config)?;
    let store = FileStore::new(&config.output_dir);

    let mut visits = Box::pin(Traversal::from_config(client, store, &config).into_stream());
    let mut report = TraversalReport::default();
    while let Some(visit) = visits.next().await {
        report.record(&visit);
        if report.visited() % 100 == 0 {
            tracing::info!(
                visited = report.visited(),
                failed = report.failed,
                "Progress"
            );
        }
    }

    tracing::info!(
        saved = report.saved,
        skipped = report.skipped,
        failed = report.failed,
        "Data collection and saving complete."
    );
    Ok(report)
}
