//! Cancellation and record removal.

use crate::error::{Error, Result};
use crate::types::{Event, JobId, JobUpdate};

use super::Downloader;

/// Failure detail recorded for cancelled jobs
pub(crate) const CANCELLED_DETAIL: &str = "cancelled";

impl Downloader {
    /// Cancel a running job
    ///
    /// Signals the job's cancellation token and moves the record to `error`
    /// with detail `cancelled`. The backend notices at its next reported
    /// transition; whatever it produces afterwards is dropped.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if the job does not exist
    /// - `Error::InvalidState` if the job is already completed or failed
    pub async fn cancel(&self, id: JobId) -> Result<()> {
        let job = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound { id: id.to_string() })?;

        if job.status.is_terminal() {
            return Err(Error::InvalidState {
                id,
                operation: "cancel".to_string(),
                current: job.status,
            });
        }

        if let Some(token) = self.task_state.active_jobs.lock().await.get(&id) {
            token.cancel();
        }

        let outcome = self
            .store
            .update(id, JobUpdate::Fail(CANCELLED_DETAIL.to_string()))
            .await?;
        if !outcome.changed {
            // The backend finished between the read and the update
            return Err(Error::InvalidState {
                id,
                operation: "cancel".to_string(),
                current: outcome.job.status,
            });
        }

        tracing::info!(job_id = %id, "job cancelled");
        self.emit(Event::Failed {
            id,
            error: CANCELLED_DETAIL.to_string(),
        });
        Ok(())
    }

    /// Remove a job record and its local file
    ///
    /// A still-running driving task is cancelled first. Returns `false` if
    /// the record was already gone; removing twice is not an error.
    pub(crate) async fn reclaim(&self, id: JobId) -> Result<bool> {
        if let Some(token) = self.task_state.active_jobs.lock().await.get(&id) {
            token.cancel();
        }

        let Some(job) = self.store.delete(id).await? else {
            return Ok(false);
        };

        if let Some(asset) = &job.result_location {
            self.discard_asset(id, asset).await;
        }

        tracing::debug!(job_id = %id, status = %job.status, "job removed");
        self.emit(Event::Removed { id });
        Ok(true)
    }
}
