//! Job orchestration split into focused submodules.
//!
//! The `Downloader` struct and its methods are organized by domain:
//! - [`jobs`] - Submission and status queries
//! - [`tasks`] - The per-job driving task
//! - [`control`] - Cancellation and record removal
//! - [`delivery`] - Result delivery and grace-delay cleanup
//! - [`info`] - Video metadata lookups
//! - [`services`] - Background service starters
//! - [`lifecycle`] - Shutdown coordination

mod control;
mod delivery;
mod info;
mod jobs;
mod lifecycle;
mod services;
mod tasks;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use delivery::Delivery;

use crate::backend::{self, Backend};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{JobStore, MemoryJobStore};
use crate::types::{Capabilities, Event, JobId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Running-task bookkeeping
#[derive(Clone)]
pub(crate) struct TaskState {
    /// Map of running jobs to their cancellation tokens
    pub(crate) active_jobs: Arc<Mutex<HashMap<JobId, CancellationToken>>>,
    /// Flag to indicate whether new jobs are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Root token cancelled at shutdown; stops the janitor and pending cleanups
    pub(crate) shutdown: CancellationToken,
}

/// Main orchestrator instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Downloader {
    /// Job record storage
    /// Public for integration tests to inspect job records
    pub store: Arc<dyn JobStore>,
    /// Fetch/extract backend (usually a fallback chain)
    pub(crate) backend: Arc<dyn Backend>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Running-task bookkeeping
    pub(crate) task_state: TaskState,
}

impl Downloader {
    /// Create a new Downloader from configuration
    ///
    /// Builds the configured backend chain and an in-memory job store.
    pub async fn new(config: Config) -> Result<Self> {
        let backend = backend::build_backend(&config)?;
        Self::with_components(config, Arc::new(MemoryJobStore::new()), backend).await
    }

    /// Create a Downloader with an explicit store and backend
    ///
    /// Validates the configuration and makes sure the download directory exists.
    pub async fn with_components(
        config: Config,
        store: Arc<dyn JobStore>,
        backend: Arc<dyn Backend>,
    ) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.jobs.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.jobs.download_dir.display(),
                        e
                    ),
                ))
            })?;

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            store,
            backend,
            event_tx,
            config: Arc::new(config),
            task_state: TaskState {
                active_jobs: Arc::new(Mutex::new(HashMap::new())),
                accepting_new: Arc::new(AtomicBool::new(true)),
                shutdown: CancellationToken::new(),
            },
        })
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Configuration in use
    pub fn get_config(&self) -> Arc<Config> {
        self.config.clone()
    }

    /// What the configured backend can do
    pub fn capabilities(&self) -> Capabilities {
        let caps = self.backend.capabilities();
        Capabilities {
            backend: self.backend.name().to_string(),
            video_info: caps.can_describe,
            fetch: caps.can_fetch,
        }
    }

    /// Number of jobs whose driving task is still running
    pub async fn active_job_count(&self) -> usize {
        self.task_state.active_jobs.lock().await.len()
    }

    pub(crate) fn emit(&self, event: Event) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
