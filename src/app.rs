//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads configuration
//! - builds the shared statistics store
//! - starts the feed updater schedule
//! - serves the HTTP API until Ctrl-C

use std::time::Duration;

use crate::cli::{Cli, Settings};
use crate::data::OwidClient;
use crate::error::AppError;
use crate::query::StatisticsQuery;
use crate::store::StatisticsStore;

pub mod updater;

pub use updater::{CycleReport, Updater, UpdaterHandle};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Entry point for the `covid-stats` binary.
pub fn run() -> Result<(), AppError> {
    let settings = Cli::load().into_settings()?;

    // Everything shares one thread; only the feed download leaves it, on the blocking pool.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::server(format!("Failed to start runtime: {e}")))?;

    let result = runtime.block_on(serve(settings));

    // An abandoned feed download may still hold a blocking thread; don't wait on it.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn serve(settings: Settings) -> Result<(), AppError> {
    let store = StatisticsStore::new();

    let client = OwidClient::new(settings.source_url.clone(), settings.fetch_timeout);
    let updater = Updater::new(client, store.clone(), settings.country.clone());
    let handle = updater.spawn(settings.update_interval);

    let query = StatisticsQuery::new(store, settings.range_policy);
    eprintln!(
        "[server] Serving statistics for '{}' (range policy: {:?}).",
        settings.country, settings.range_policy
    );

    let result = crate::api::serve(settings.addr, query, shutdown_signal()).await;

    handle.stop().await;
    result
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        eprintln!("[server] Failed to listen for Ctrl-C: {err}");
        // Without a signal handler, run until killed.
        std::future::pending::<()>().await;
    }
    eprintln!("[server] Shutting down...");
}
