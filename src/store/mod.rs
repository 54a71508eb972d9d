//! Job record storage
//!
//! The orchestrator, delivery service and janitor all go through the
//! [`JobStore`] trait, so the backing storage can be swapped without touching
//! them. The shipped implementation is [`MemoryJobStore`]; job records do not
//! survive a restart.

use crate::error::Result;
use crate::types::{Job, JobId, JobUpdate, UpdateOutcome};
use async_trait::async_trait;

mod memory;

pub use memory::MemoryJobStore;

/// Storage for job records
///
/// Every method is atomic per key: an [`update`](JobStore::update) observes
/// and replaces a single record without interleaving with another writer.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a freshly created job
    ///
    /// # Errors
    ///
    /// Returns `Error::Other` if a record with the same id already exists.
    async fn create(&self, job: Job) -> Result<()>;

    /// Fetch a copy of a job record
    async fn get(&self, id: JobId) -> Result<Option<Job>>;

    /// Apply an update to a job record
    ///
    /// Updates to terminal jobs are ignored and reported with
    /// `changed = false`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the job does not exist, or the error
    /// produced by [`Job::apply`] for an invalid `Delivered` stamp.
    async fn update(&self, id: JobId, update: JobUpdate) -> Result<UpdateOutcome>;

    /// Remove a job record, returning it if it existed
    async fn delete(&self, id: JobId) -> Result<Option<Job>>;

    /// Copies of all live job records, oldest first
    async fn list(&self) -> Result<Vec<Job>>;
}
