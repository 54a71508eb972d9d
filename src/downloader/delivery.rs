//! Result delivery and the grace-delay cleanup that follows it.

use crate::error::{Error, Result, UnavailableReason};
use crate::types::{Asset, Event, JobId, JobStatus, JobUpdate};
use chrono::Utc;
use std::path::PathBuf;

use super::Downloader;

/// How a completed job's result reaches the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Redirect the caller to an external URL
    Redirect {
        /// Asset URL
        url: String,
    },
    /// Stream a file from the download directory
    File {
        /// File on disk
        path: PathBuf,
        /// Name sent in `Content-Disposition`
        filename: String,
    },
}

impl Downloader {
    /// Resolve a job's result for delivery
    ///
    /// The first successful delivery stamps the job and schedules removal of
    /// the record (and its local file) after the configured grace delay.
    /// Later deliveries inside that window succeed without rescheduling.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` for unknown or removed jobs
    /// - `Error::ResultUnavailable` while the job is still running, after it
    ///   failed, or when its local file has disappeared
    pub async fn deliver(&self, id: JobId) -> Result<Delivery> {
        let job = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound { id: id.to_string() })?;

        let unavailable = |reason| Error::ResultUnavailable { id, reason };

        let delivery = match (job.status, job.result_location) {
            (JobStatus::Completed, Some(Asset::Remote { url, .. })) => Delivery::Redirect { url },
            (JobStatus::Completed, Some(Asset::Local { path, filename })) => {
                if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    tracing::warn!(job_id = %id, path = %path.display(), "result file missing");
                    return Err(unavailable(UnavailableReason::FileMissing));
                }
                Delivery::File { path, filename }
            }
            (JobStatus::Completed, None) => {
                return Err(unavailable(UnavailableReason::FileMissing));
            }
            (JobStatus::Error, _) => {
                return Err(unavailable(UnavailableReason::Failed(
                    job.error_detail.unwrap_or_default(),
                )));
            }
            (status, _) => return Err(unavailable(UnavailableReason::Pending(status))),
        };

        let outcome = self
            .store
            .update(id, JobUpdate::Delivered(Utc::now()))
            .await?;
        if outcome.changed {
            tracing::info!(job_id = %id, "result delivered");
            self.emit(Event::Delivered { id });
            self.schedule_cleanup(id);
        }

        Ok(delivery)
    }

    /// Remove the job once the grace delay has elapsed
    fn schedule_cleanup(&self, id: JobId) {
        let downloader = self.clone();
        let grace_delay = self.config.jobs.grace_delay;
        let shutdown = self.task_state.shutdown.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!(job_id = %id, "shutdown before grace delay elapsed");
                }
                _ = tokio::time::sleep(grace_delay) => {
                    match downloader.reclaim(id).await {
                        Ok(true) => tracing::debug!(job_id = %id, "delivered job cleaned up"),
                        Ok(false) => {}
                        Err(e) => tracing::warn!(job_id = %id, error = %e, "delivered job cleanup failed"),
                    }
                }
            }
        });
    }
}
