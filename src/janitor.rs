//! Periodic reclamation of stale jobs and orphaned files
//!
//! Delivery removes a job a short while after its result is fetched, but
//! jobs that are never fetched (and files whose job record is gone) would
//! otherwise accumulate. The janitor sweeps both on a fixed interval:
//!
//! - job records older than `jobs.job_max_age` are removed, cancelling the
//!   job first if it is still running and deleting its local file
//! - regular files directly under the download directory whose modification
//!   time is older than `jobs.file_max_age` are deleted
//!
//! # Example
//!
//! ```no_run
//! use tubeproxy::{Downloader, config::Config};
//! use tubeproxy::janitor::Janitor;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Arc::new(Downloader::new(Config::default()).await?);
//! let janitor = Janitor::new(downloader.clone());
//!
//! // Run janitor (returns once shutdown completes)
//! tokio::spawn(async move {
//!     janitor.run().await;
//! });
//! # Ok(())
//! # }
//! ```

use crate::downloader::Downloader;
use crate::utils::remove_file_if_exists;
use chrono::{DateTime, TimeDelta, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a single sweep removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Job records removed for exceeding the maximum age
    pub jobs_removed: usize,
    /// Files deleted from the download directory
    pub files_removed: usize,
}

/// Background sweeper for stale jobs and files
pub struct Janitor {
    downloader: Arc<Downloader>,
}

impl Janitor {
    /// Creates a janitor for the given orchestrator
    pub fn new(downloader: Arc<Downloader>) -> Self {
        Self { downloader }
    }

    /// Sweep every `jobs.janitor_interval` until shutdown
    pub async fn run(self) {
        let interval = self.downloader.config.jobs.janitor_interval;
        let shutdown = self.downloader.task_state.shutdown.clone();
        info!(interval_secs = interval.as_secs(), "Janitor started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Janitor shutting down");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    let report = self.sweep_at(Utc::now()).await;
                    if report != SweepReport::default() {
                        info!(
                            jobs_removed = report.jobs_removed,
                            files_removed = report.files_removed,
                            "Janitor sweep complete"
                        );
                    }
                }
            }
        }
    }

    /// Run one sweep, treating `now` as the current time
    ///
    /// Failures on individual jobs or files are logged and skipped; a missing
    /// download directory counts as empty.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let jobs = &self.downloader.config.jobs;
        SweepReport {
            jobs_removed: self.sweep_jobs(now, age_limit(jobs.job_max_age)).await,
            files_removed: sweep_files(&jobs.download_dir, now, age_limit(jobs.file_max_age))
                .await,
        }
    }

    async fn sweep_jobs(&self, now: DateTime<Utc>, max_age: TimeDelta) -> usize {
        let jobs = match self.downloader.store.list().await {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!(error = %e, "Failed to list jobs for sweep");
                return 0;
            }
        };

        let mut removed = 0;
        for job in jobs.iter().filter(|job| now - job.created_at > max_age) {
            match self.downloader.reclaim(job.id).await {
                Ok(true) => {
                    debug!(job_id = %job.id, status = %job.status, "Removed stale job");
                    removed += 1;
                }
                Ok(false) => {}
                Err(e) => warn!(job_id = %job.id, error = %e, "Failed to remove stale job"),
            }
        }
        removed
    }
}

fn age_limit(max_age: Duration) -> TimeDelta {
    TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX)
}

async fn sweep_files(dir: &Path, now: DateTime<Utc>, max_age: TimeDelta) -> usize {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Failed to read download directory");
            return 0;
        }
    };

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to read directory entry");
                break;
            }
        };

        // Vanished entries fail here and are skipped
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if now - DateTime::<Utc>::from(modified) <= max_age {
            continue;
        }

        let path = entry.path();
        match remove_file_if_exists(&path).await {
            Ok(true) => {
                debug!(path = %path.display(), "Removed stale file");
                removed += 1;
            }
            Ok(false) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove stale file"),
        }
    }
    removed
}
