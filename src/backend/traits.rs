//! Traits and types for fetch/extract backends

use super::JobReporter;
use crate::error::BackendError;
use crate::quality::Quality;
use crate::types::{Asset, JobId, VideoInfo};
use async_trait::async_trait;
use std::path::PathBuf;

/// What a backend is asked to produce
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Job the asset belongs to (used for display filenames)
    pub job_id: JobId,
    /// Validated video URL
    pub url: String,
    /// Effective quality
    pub quality: Quality,
    /// Directory for locally produced files
    pub download_dir: PathBuf,
}

/// Capabilities of a backend implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapabilities {
    /// Can return video metadata
    pub can_describe: bool,
    /// Can produce a downloadable asset
    pub can_fetch: bool,
}

/// Trait for fetch/extract backends
///
/// Implementations may talk to an HTTP service, run an external binary, or
/// fake the whole thing. Cancellation is cooperative: the job's driving task
/// drops the `fetch` future when the job is cancelled, and the
/// [`JobReporter`] refuses further updates once the job's token fires.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Human-readable name for logging and the health endpoint
    fn name(&self) -> &str;

    /// Query capabilities of this backend
    fn capabilities(&self) -> BackendCapabilities;

    /// Describe a video
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unsupported` for fetch-only backends, or the
    /// transport/parse error that prevented the lookup.
    async fn video_info(&self, url: &str) -> Result<VideoInfo, BackendError>;

    /// Produce the asset for a job
    ///
    /// Intermediate `fetching_info` / `downloading` stages are reported
    /// through `reporter`; each report is immediately visible to pollers.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unsupported` for metadata-only backends,
    /// `BackendError::Cancelled` if the job was cancelled, or whatever went
    /// wrong while producing the asset.
    async fn fetch(
        &self,
        request: &FetchRequest,
        reporter: &JobReporter,
    ) -> Result<Asset, BackendError>;
}
