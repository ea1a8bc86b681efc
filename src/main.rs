//! # Tender Watch
//!
//! Watches a configurable set of tender notice boards, keeps the listings
//! that match the operator's keywords, and reports what is new since the
//! previous run.
//!
//! ## Usage
//!
//! ```sh
//! tender_watch -c config/config.yaml          # loop forever
//! tender_watch -c config/config.yaml --once   # single run
//! ```
//!
//! ## Architecture
//!
//! Each run is a batch pipeline:
//! 1. **Sites**: Expand the site list, including grouped definitions
//! 2. **Scraping**: Fetch every site concurrently, extract and filter records
//! 3. **Dedup**: Compare against the previous snapshot to find new records
//! 4. **Output**: Write the CSV export and replace the snapshot
//! 5. **Notify**: Queue a notification when there is something new

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dedup;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scheduler;
mod scrapers;
mod sites;
mod utils;

use cli::Cli;
use config::{Settings, load_settings};
use models::RunResult;
use outputs::notification::OutboxNotifier;
use pipeline::Pipeline;
use scheduler::Scheduler;
use scrapers::engine::FetchEngine;

/// Load settings fresh for every run so edits to the settings file or the
/// site list apply without a restart.
async fn current_settings(args: &Cli) -> Settings {
    args.apply_overrides(load_settings(&args.config).await)
}

#[instrument(level = "info", skip_all)]
async fn run(args: &Cli) -> error::Result<RunResult> {
    let settings = current_settings(args).await;
    let engine = FetchEngine::new(&settings)?;
    let notifier = OutboxNotifier::new(settings.outbox_dir());
    Pipeline::new(settings, engine, notifier).run_once().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "tender_watch starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let interval = current_settings(&args).await.check_interval();
    let mut scheduler = Scheduler::new(interval);

    if args.once {
        let result = scheduler.run_once(|| run(&args)).await?;
        info!(
            records = result.total(),
            new = result.new_count(),
            "Single run finished"
        );
        return Ok(());
    }

    scheduler.run_forever(|| run(&args)).await;
    Ok(())
}
