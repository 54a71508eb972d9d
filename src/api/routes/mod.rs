//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`jobs`] - Job submission, status, delivery and cancellation
//! - [`info`] - Video metadata
//! - [`system`] - Health, events, OpenAPI

use crate::error::{Error, Result};
use crate::types::{Capabilities, JobId, JobSnapshot, VideoInfo};
use serde::{Deserialize, Serialize};

mod info;
mod jobs;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use info::*;
pub use jobs::*;
pub use system::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for POST /api/video-info
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct VideoInfoRequest {
    /// Video URL
    pub url: String,
}

/// Request body for POST /api/download
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadRequest {
    /// Video URL
    pub url: String,
    /// Requested quality: `audio`, `best`, or a height such as `720p`.
    /// Missing or unrecognised values use the configured default.
    #[serde(default)]
    pub quality: Option<String>,
}

/// Response for POST /api/video-info
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VideoInfoResponse {
    /// Always true
    pub success: bool,
    /// Video metadata
    pub info: VideoInfo,
}

/// Response for POST /api/download
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadStartedResponse {
    /// Always true
    pub success: bool,
    /// Id to poll with
    pub download_id: JobId,
    /// Human-readable confirmation
    pub message: String,
}

/// Response for GET /api/download-status/:id
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StatusResponse {
    /// Always true
    pub success: bool,
    /// Current job snapshot
    pub status: JobSnapshot,
}

/// Response for GET /api/downloads
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct JobListResponse {
    /// Always true
    pub success: bool,
    /// Snapshots of all live jobs, oldest first
    pub downloads: Vec<JobSnapshot>,
}

/// Generic success acknowledgement
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    /// Always true
    pub success: bool,
    /// Human-readable confirmation
    pub message: String,
}

/// Response for GET /api/health
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: String,
    /// Crate version
    pub version: String,
    /// Configured backend name
    pub backend: String,
    /// What the backend can do
    pub capabilities: Capabilities,
}

/// Parse a job id from a path segment
///
/// Anything that is not a well-formed id was never issued, so it reads as
/// not found rather than as bad input.
pub(crate) fn parse_job_id(raw: &str) -> Result<JobId> {
    raw.parse().map_err(|_| Error::NotFound {
        id: raw.to_string(),
    })
}
