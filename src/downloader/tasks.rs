//! The per-job driving task.

use crate::backend::{FetchRequest, JobReporter};
use crate::error::{BackendError, Error};
use crate::types::{Asset, Event, Job, JobId, JobUpdate};
use crate::utils::remove_file_if_exists;
use tokio_util::sync::CancellationToken;

use super::Downloader;

impl Downloader {
    /// Spawn the single task that drives `job` to a terminal state
    ///
    /// The caller must already have registered `cancel` in the active-job map.
    pub(crate) fn spawn_job_task(&self, job: &Job, cancel: CancellationToken) {
        let request = FetchRequest {
            job_id: job.id,
            url: job.url.clone(),
            quality: job.quality,
            download_dir: self.config.jobs.download_dir.clone(),
        };
        let downloader = self.clone();

        tokio::spawn(async move {
            let job_id = request.job_id;
            let result = downloader.run_backend(&request, &cancel).await;
            downloader.finish_job(job_id, result).await;
            downloader.task_state.active_jobs.lock().await.remove(&job_id);
        });
    }

    /// Run the backend under the job timeout, racing it against cancellation
    async fn run_backend(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<Asset, BackendError> {
        let reporter = JobReporter::new(
            self.store.clone(),
            request.job_id,
            cancel.clone(),
            self.event_tx.clone(),
        );
        let job_timeout = self.config.jobs.job_timeout;

        tracing::debug!(
            job_id = %request.job_id,
            backend = self.backend.name(),
            timeout_secs = job_timeout.as_secs(),
            "starting backend"
        );

        tokio::select! {
            _ = cancel.cancelled() => Err(BackendError::Cancelled),
            result = tokio::time::timeout(job_timeout, self.backend.fetch(request, &reporter)) => {
                match result {
                    Ok(outcome) => outcome,
                    Err(_) => Err(BackendError::Timeout {
                        backend: self.backend.name().to_string(),
                        after: job_timeout,
                    }),
                }
            }
        }
    }

    /// Record the backend's outcome as the job's terminal state
    ///
    /// A local file produced for a job that was already terminal or already
    /// removed is deleted, since nothing will ever deliver it.
    async fn finish_job(&self, id: JobId, result: Result<Asset, BackendError>) {
        let update = match &result {
            Ok(asset) => JobUpdate::Complete(asset.clone()),
            Err(e) => JobUpdate::Fail(e.to_string()),
        };

        match self.store.update(id, update).await {
            Ok(outcome) if outcome.changed => match result {
                Ok(asset) => {
                    tracing::info!(job_id = %id, filename = asset.filename(), "job completed");
                    self.emit(Event::Completed {
                        id,
                        filename: asset.filename().to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(job_id = %id, error = %e, "job failed");
                    self.emit(Event::Failed {
                        id,
                        error: e.to_string(),
                    });
                }
            },
            Ok(outcome) => {
                tracing::debug!(
                    job_id = %id,
                    status = %outcome.job.status,
                    "job already terminal, backend outcome dropped"
                );
                if let Ok(asset) = &result
                    && outcome.job.result_location.as_ref() != Some(asset)
                {
                    self.discard_asset(id, asset).await;
                }
            }
            Err(Error::NotFound { .. }) => {
                tracing::debug!(job_id = %id, "job removed before the backend finished");
                if let Ok(asset) = &result {
                    self.discard_asset(id, asset).await;
                }
            }
            Err(e) => {
                tracing::error!(job_id = %id, error = %e, "failed to record job outcome");
            }
        }
    }

    pub(crate) async fn discard_asset(&self, id: JobId, asset: &Asset) {
        if let Some(path) = asset.local_path()
            && let Err(e) = remove_file_if_exists(path).await
        {
            tracing::warn!(
                job_id = %id,
                path = %path.display(),
                error = %e,
                "failed to delete job file"
            );
        }
    }
}
