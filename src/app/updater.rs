//! Periodic feed refresh.
//!
//! One update cycle:
//! feed download -> streaming CSV ingest -> append records newer than the store's latest
//!
//! The download and parse are synchronous and run on tokio's blocking pool; the
//! ticker and the store append run on the async side.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::data::FeedSource;
use crate::domain::FeedFilter;
use crate::error::AppError;
use crate::io::ingest::ingest_feed;
use crate::store::StatisticsStore;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24);

/// What one successful update cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub rows_read: usize,
    pub records_parsed: usize,
    pub records_appended: usize,
    pub stopped_early: bool,
}

pub struct Updater<S> {
    source: Arc<S>,
    store: StatisticsStore,
    location: String,
    pinned_year: Option<i32>,
}

impl<S: FeedSource> Updater<S> {
    pub fn new(source: S, store: StatisticsStore, location: impl Into<String>) -> Self {
        Self {
            source: Arc::new(source),
            store,
            location: location.into(),
            pinned_year: None,
        }
    }

    #[cfg(test)]
    fn pin_year(mut self, year: i32) -> Self {
        self.pinned_year = Some(year);
        self
    }

    /// Run one cycle for the current calendar year.
    pub async fn run_cycle(&self) -> Result<CycleReport, AppError> {
        let year = self.pinned_year.unwrap_or_else(|| Local::now().year());
        self.run_cycle_for_year(year).await
    }

    /// Run one cycle keeping only rows dated in `year`.
    ///
    /// Nothing is appended if the download or the parse fails.
    pub async fn run_cycle_for_year(&self, year: i32) -> Result<CycleReport, AppError> {
        let source = Arc::clone(&self.source);
        let filter = FeedFilter::new(self.location.clone(), year);

        let outcome = tokio::task::spawn_blocking(move || {
            let stream = source.open()?;
            ingest_feed(stream, &filter)
        })
        .await
        .map_err(|e| AppError::feed(format!("Update task panicked: {e}")))??;

        let records_parsed = outcome.records.len();
        let records_appended = self.store.extend(outcome.records).await;

        Ok(CycleReport {
            rows_read: outcome.rows_read,
            records_parsed,
            records_appended,
            stopped_early: outcome.stopped_early,
        })
    }

    /// Start the schedule: one cycle right away, then one per `interval`.
    ///
    /// A failed cycle is logged and the schedule carries on. Dropping the
    /// returned handle detaches the schedule; only [`UpdaterHandle::stop`] ends it.
    pub fn spawn(self, interval: Duration) -> UpdaterHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    Ok(()) = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }

                eprintln!(
                    "[updater] Starting update from {} for '{}'...",
                    self.source.describe(),
                    self.location
                );

                // A stop request abandons the cycle; its blocking download is detached.
                let result = tokio::select! {
                    biased;
                    Ok(()) = stop_rx.changed() => {
                        eprintln!("[updater] Stop requested, abandoning update in progress.");
                        break;
                    }
                    result = self.run_cycle() => result,
                };

                match result {
                    Ok(report) => eprintln!(
                        "[updater] Read {} row(s), parsed {} record(s), appended {}{}.",
                        report.rows_read,
                        report.records_parsed,
                        report.records_appended,
                        if report.stopped_early { " (stopped after target rows)" } else { "" }
                    ),
                    Err(err) => eprintln!(
                        "[updater] Update failed, next attempt in {}s: {err}",
                        interval.as_secs()
                    ),
                }
            }
            eprintln!("[updater] Stopped.");
        });

        UpdaterHandle { stop_tx, task }
    }
}

/// Owner of a running update schedule.
pub struct UpdaterHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl UpdaterHandle {
    /// Stop the schedule and wait for its task to exit.
    ///
    /// Returns without waiting for an in-flight download: the cycle is dropped
    /// before it touches the store, and the blocking read is left to finish on
    /// its own thread.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }
}
