//! Download command implementation.
//!
//! Merges the optional config file with command-line flags, then runs the
//! ingestion pipeline until the range is exhausted or live tail is stopped.

use crate::display::{BarProgress, KeypressProbe};
use crate::logging;
use anyhow::{Context, Result};
use clap::Args;
use std::io::IsTerminal;
use std::path::PathBuf;
use tickwell_lib::control::{AnyOf, CancelFlag};
use tickwell_lib::{
    DownloadClient, MonthIndexing, PipelineOrchestrator, ResumePolicy, Settings, Verbosity,
};
use tracing::{info, warn};

/// Flags for `tickwell download`. Every flag overrides the config file.
#[derive(Debug, Args)]
pub(crate) struct DownloadArgs {
    /// Instrument identifier (e.g., eurusd, usdjpy)
    asset: Option<String>,

    /// First day (YYYY-MM-DD)
    #[arg(short, long)]
    start: Option<String>,

    /// Last day (YYYY-MM-DD), inclusive
    #[arg(short, long)]
    end: Option<String>,

    /// Bar interval such as 30s, 5m, 1h, 1d (omit for raw ticks)
    #[arg(short, long)]
    interval: Option<String>,

    /// CSV output file
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// SQLite connection string (sqlite://path/to/file.db)
    #[arg(long, value_name = "CONN")]
    store: Option<String>,

    /// restart, continue-to-end or continue-to-now-and-tail
    #[arg(short, long, value_name = "POLICY")]
    resume: Option<ResumePolicy>,

    /// silent, progress or verbose
    #[arg(long, value_name = "LEVEL")]
    verbosity: Option<Verbosity>,

    /// Seconds between live-tail polls
    #[arg(long, value_name = "N")]
    tail_poll_secs: Option<u64>,

    /// Feed base URL
    #[arg(long, value_name = "URL")]
    feed_url: Option<String>,

    /// Month numbering in feed URLs (zero or one)
    #[arg(long)]
    month_indexing: Option<MonthIndexing>,

    /// TOML file with the same keys as these flags
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl DownloadArgs {
    fn into_parts(self) -> (Option<PathBuf>, Settings) {
        let overrides = Settings {
            asset: self.asset,
            start: self.start,
            end: self.end,
            interval: self.interval,
            csv: self.csv,
            store: self.store,
            resume: self.resume,
            verbosity: self.verbosity,
            tail_poll_secs: self.tail_poll_secs,
            feed_url: self.feed_url,
            month_indexing: self.month_indexing,
        };
        (self.config, overrides)
    }
}

/// Run one ingestion.
pub(crate) async fn download(args: DownloadArgs, log_json: bool) -> Result<()> {
    let (config_file, overrides) = args.into_parts();
    let base = match &config_file {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => Settings::default(),
    };
    let config = base
        .merge(overrides)
        .validate()
        .context("Invalid configuration")?;

    let verbosity = config.verbosity;
    logging::init(verbosity, log_json)?;

    let sinks = config.open_sinks().context("Failed to open output")?;
    if sinks.is_empty() {
        warn!(
            asset = %config.instrument.symbol(),
            "No --csv or --store given, ticks are decoded and counted only"
        );
    }
    let client = DownloadClient::with_defaults().context("Failed to build HTTP client")?;

    let mut cancel = AnyOf::new();
    if matches!(config.resume, ResumePolicy::ContinueToNowAndTail) {
        cancel = cancel.or(interrupt_flag());
        if std::io::stdin().is_terminal() {
            cancel = cancel.or(KeypressProbe);
        }
    }

    let progress = BarProgress::new(config.instrument.symbol(), verbosity.shows_progress());
    let summary = PipelineOrchestrator::new(config, client, sinks)
        .with_progress(progress)
        .with_cancellation(cancel)
        .run()
        .await
        .context("Ingestion aborted")?;

    if !matches!(verbosity, Verbosity::Silent) {
        println!("{summary}");
    }
    Ok(())
}

/// First Ctrl-C stops live tail at the next poll; a second one exits.
fn interrupt_flag() -> CancelFlag {
    let flag = CancelFlag::new();
    let handle = flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current poll");
            handle.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });
    flag
}
