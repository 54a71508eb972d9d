//! Progress reporting from a backend into the job store

use crate::error::{BackendError, Error};
use crate::store::JobStore;
use crate::types::{Event, JobId, JobStatus, JobUpdate};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Handle a backend uses to publish intermediate progress for one job
///
/// Every call is an immediate store update, so pollers see stages as they
/// happen. Once the job's cancellation token fires (or the record has been
/// reclaimed) every call returns `BackendError::Cancelled`, which lets a
/// backend bail out at its next transition.
#[derive(Clone)]
pub struct JobReporter {
    store: Arc<dyn JobStore>,
    job_id: JobId,
    cancel: CancellationToken,
    events: broadcast::Sender<Event>,
}

impl JobReporter {
    /// Bind a reporter to a job
    pub fn new(
        store: Arc<dyn JobStore>,
        job_id: JobId,
        cancel: CancellationToken,
        events: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            store,
            job_id,
            cancel,
            events,
        }
    }

    /// Job this reporter writes to
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Whether the job has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Move the job to an intermediate status
    pub async fn stage(&self, status: JobStatus, progress: u8) -> Result<(), BackendError> {
        self.apply(JobUpdate::Stage { status, progress }).await
    }

    /// Raise the job's progress without changing status
    pub async fn progress(&self, progress: u8) -> Result<(), BackendError> {
        self.apply(JobUpdate::Progress(progress)).await
    }

    /// Record the display filename once it is known
    pub async fn filename(&self, name: impl Into<String>) -> Result<(), BackendError> {
        self.apply(JobUpdate::Filename(name.into())).await
    }

    async fn apply(&self, update: JobUpdate) -> Result<(), BackendError> {
        if self.cancel.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let announce = matches!(update, JobUpdate::Stage { .. } | JobUpdate::Progress(_));
        match self.store.update(self.job_id, update).await {
            Ok(outcome) => {
                if announce && outcome.changed {
                    // No subscribers is fine
                    let _ = self.events.send(Event::Progress {
                        id: self.job_id,
                        status: outcome.job.status,
                        progress: outcome.job.progress,
                    });
                }
                Ok(())
            }
            Err(Error::NotFound { .. }) => {
                tracing::debug!(job_id = %self.job_id, "job record gone, stopping backend");
                Err(BackendError::Cancelled)
            }
            Err(e) => {
                tracing::warn!(job_id = %self.job_id, error = %e, "failed to record progress");
                Ok(())
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support;

    #[tokio::test]
    async fn test_stage_is_visible_immediately() {
        let (reporter, store, id) = test_support::reporter().await;

        reporter.stage(JobStatus::FetchingInfo, 10).await.unwrap();

        let job = store.get(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::FetchingInfo);
        assert_eq!(job.progress, 10);
    }

    #[tokio::test]
    async fn test_stage_emits_progress_event() {
        let store = Arc::new(crate::store::MemoryJobStore::new());
        let job = crate::types::Job::new(
            "https://youtu.be/dQw4w9WgXcQ",
            crate::quality::Quality::Best,
            chrono::Utc::now(),
        );
        let id = job.id;
        store.create(job).await.unwrap();
        let (events, mut rx) = broadcast::channel(8);
        let reporter = JobReporter::new(store, id, CancellationToken::new(), events);

        reporter.stage(JobStatus::Downloading, 40).await.unwrap();

        match rx.recv().await.unwrap() {
            Event::Progress {
                id: event_id,
                status,
                progress,
            } => {
                assert_eq!(event_id, id);
                assert_eq!(status, JobStatus::Downloading);
                assert_eq!(progress, 40);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_reporter_refuses_updates() {
        let store = Arc::new(crate::store::MemoryJobStore::new());
        let job = crate::types::Job::new(
            "https://youtu.be/dQw4w9WgXcQ",
            crate::quality::Quality::Best,
            chrono::Utc::now(),
        );
        let id = job.id;
        store.create(job).await.unwrap();
        let token = CancellationToken::new();
        let (events, _) = broadcast::channel(8);
        let reporter = JobReporter::new(store.clone(), id, token.clone(), events);

        token.cancel();
        let err = reporter.progress(50).await.unwrap_err();

        assert!(matches!(err, BackendError::Cancelled));
        assert_eq!(store.get(id).await.unwrap().unwrap().progress, 0);
    }

    #[tokio::test]
    async fn test_removed_job_reads_as_cancelled() {
        let (reporter, store, id) = test_support::reporter().await;
        store.delete(id).await.unwrap();

        let err = reporter.stage(JobStatus::Downloading, 30).await.unwrap_err();
        assert!(matches!(err, BackendError::Cancelled));
    }
}
