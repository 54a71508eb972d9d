//! Job submission and status queries.

use crate::error::{Error, Result};
use crate::quality::Quality;
use crate::types::{Event, Job, JobId, JobSnapshot};
use crate::utils::is_valid_video_url;
use chrono::Utc;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;

use super::Downloader;

impl Downloader {
    /// Start a job for a video URL
    ///
    /// The job is created in `processing` with progress 0 and its id is
    /// returned right away; the backend runs in a spawned task. `quality` is
    /// parsed leniently: anything unrecognised becomes the configured default.
    ///
    /// # Errors
    ///
    /// - `Error::ShuttingDown` once shutdown has begun
    /// - `Error::InvalidInput` if the URL is not a recognised video URL (no job is created)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use tubeproxy::*;
    /// # async fn example(downloader: Downloader) -> Result<()> {
    /// let id = downloader
    ///     .submit("https://www.youtube.com/watch?v=dQw4w9WgXcQ", Some("720p"))
    ///     .await?;
    /// let status = downloader.get_status(id).await?;
    /// println!("{} is {}", id, status.status);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit(&self, url: &str, quality: Option<&str>) -> Result<JobId> {
        if !self.task_state.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let url = url.trim();
        if !is_valid_video_url(url) {
            return Err(Error::InvalidInput(
                "URL is not a recognised video URL".to_string(),
            ));
        }

        let quality = Quality::parse_or(quality, self.config.jobs.default_quality);
        let job = Job::new(url, quality, Utc::now());
        let id = job.id;
        let cancel = CancellationToken::new();

        {
            // Shutdown clears the flag before it cancels under this lock
            let mut active = self.task_state.active_jobs.lock().await;
            if !self.task_state.accepting_new.load(Ordering::SeqCst) {
                return Err(Error::ShuttingDown);
            }
            self.store.create(job.clone()).await?;
            // Register before spawning so the task's own cleanup can never run first
            active.insert(id, cancel.clone());
        }

        tracing::info!(job_id = %id, %quality, "job submitted");
        self.emit(Event::Queued {
            id,
            url: url.to_string(),
        });
        self.spawn_job_task(&job, cancel);

        Ok(id)
    }

    /// Current snapshot of a job
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for ids that were never issued and for jobs
    /// that have already been removed.
    pub async fn get_status(&self, id: JobId) -> Result<JobSnapshot> {
        self.store
            .get(id)
            .await?
            .map(|job| job.snapshot())
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    /// Snapshots of every live job, oldest first
    pub async fn list(&self) -> Result<Vec<JobSnapshot>> {
        Ok(self
            .store
            .list()
            .await?
            .iter()
            .map(Job::snapshot)
            .collect())
    }
}
