//! Process-lifetime in-memory job store

use super::JobStore;
use crate::error::{Error, Result};
use crate::types::{Job, JobId, JobUpdate, UpdateOutcome};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Job store backed by a `HashMap` behind a tokio `RwLock`
///
/// Status reads take the read lock briefly; updates hold the write lock only
/// for the duration of [`Job::apply`].
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl MemoryJobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job: Job) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(Error::Other(format!("job {} already exists", job.id)));
        }
        jobs.insert(job.id, job);
        Ok(())
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn update(&self, id: JobId, update: JobUpdate) -> Result<UpdateOutcome> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or_else(|| Error::NotFound {
            id: id.to_string(),
        })?;

        let was_terminal = job.status.is_terminal();
        let changed = job.apply(update, Utc::now())?;
        if !changed && was_terminal {
            tracing::debug!(job_id = %id, status = %job.status, "ignored update to terminal job");
        }

        Ok(UpdateOutcome {
            job: job.clone(),
            changed,
        })
    }

    async fn delete(&self, id: JobId) -> Result<Option<Job>> {
        Ok(self.jobs.write().await.remove(&id))
    }

    async fn list(&self) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by_key(|job| job.created_at);
        Ok(jobs)
    }
}
