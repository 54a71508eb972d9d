//! Core types for tubeproxy

use crate::error::{Error, UnavailableReason};
use crate::quality::Quality;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;
use uuid::Uuid;

/// Unique identifier for a job
///
/// Rendered as a hyphenated lowercase UUID, which is safe to use as a URL
/// path segment without percent-encoding.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Job status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, backend not started yet
    Processing,
    /// Backend is resolving metadata / formats
    FetchingInfo,
    /// Backend is producing the asset
    Downloading,
    /// Result is ready for delivery
    Completed,
    /// Failed with error
    Error,
}

impl JobStatus {
    /// Whether no further transitions can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Position along processing, fetching_info, downloading, then the terminal states
    fn rank(&self) -> u8 {
        match self {
            JobStatus::Processing => 0,
            JobStatus::FetchingInfo => 1,
            JobStatus::Downloading => 2,
            JobStatus::Completed | JobStatus::Error => 3,
        }
    }

    /// Wire name, as used in JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::FetchingInfo => "fetching_info",
            JobStatus::Downloading => "downloading",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the produced artifact lives
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Asset {
    /// Directly resolvable external URL; delivered by redirect
    Remote {
        /// Asset URL
        url: String,
        /// Suggested display filename
        filename: String,
    },
    /// File in the download directory; delivered by streaming
    Local {
        /// Absolute or working-directory-relative path
        #[schema(value_type = String)]
        path: PathBuf,
        /// Display filename sent in Content-Disposition
        filename: String,
    },
}

impl Asset {
    /// Display filename of the artifact
    pub fn filename(&self) -> &str {
        match self {
            Asset::Remote { filename, .. } | Asset::Local { filename, .. } => filename,
        }
    }

    /// Local path, if the artifact is a file owned by this process
    pub fn local_path(&self) -> Option<&PathBuf> {
        match self {
            Asset::Local { path, .. } => Some(path),
            Asset::Remote { .. } => None,
        }
    }
}

/// A state change applied to a job record by the store
#[derive(Clone, Debug)]
pub enum JobUpdate {
    /// Move to an intermediate status with at least the given progress
    Stage {
        /// New non-terminal status
        status: JobStatus,
        /// Progress percentage
        progress: u8,
    },
    /// Raise progress without changing status
    Progress(u8),
    /// Record the display filename once known
    Filename(String),
    /// Terminal success
    Complete(Asset),
    /// Terminal failure with a human-readable cause
    Fail(String),
    /// First successful delivery timestamp
    Delivered(DateTime<Utc>),
}

/// Highest progress a job can report before it completes
const MAX_RUNNING_PROGRESS: u8 = 99;

/// One tracked submit-to-result work item
#[derive(Clone, Debug)]
pub struct Job {
    /// Opaque id, immutable
    pub id: JobId,
    /// Submitted URL
    pub url: String,
    /// Requested quality after fallback
    pub quality: Quality,
    /// Current status
    pub status: JobStatus,
    /// Progress percentage in [0, 100]
    pub progress: u8,
    /// Display filename, once known
    pub filename: Option<String>,
    /// Set only when completed
    pub result_location: Option<Asset>,
    /// Set only when failed
    pub error_detail: Option<String>,
    /// Creation time, used by the janitor
    pub created_at: DateTime<Utc>,
    /// Last applied mutation
    pub updated_at: DateTime<Utc>,
    /// First successful delivery
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a fresh job in `processing` with progress 0
    pub fn new(url: impl Into<String>, quality: Quality, now: DateTime<Utc>) -> Self {
        Self {
            id: JobId::new(),
            url: url.into(),
            quality,
            status: JobStatus::Processing,
            progress: 0,
            filename: None,
            result_location: None,
            error_detail: None,
            created_at: now,
            updated_at: now,
            delivered_at: None,
        }
    }

    /// Apply an update in place
    ///
    /// Returns `Ok(true)` if the record changed and `Ok(false)` if the update
    /// was ignored because the job is already terminal (or the update was a
    /// no-op). `Delivered` on a job that is not completed is an error.
    pub fn apply(&mut self, update: JobUpdate, now: DateTime<Utc>) -> Result<bool, Error> {
        if let JobUpdate::Delivered(at) = update {
            return match self.status {
                JobStatus::Completed if self.delivered_at.is_none() => {
                    self.delivered_at = Some(at);
                    self.updated_at = now;
                    Ok(true)
                }
                JobStatus::Completed => Ok(false),
                JobStatus::Error => Err(Error::ResultUnavailable {
                    id: self.id,
                    reason: UnavailableReason::Failed(self.error_detail.clone().unwrap_or_default()),
                }),
                status => Err(Error::ResultUnavailable {
                    id: self.id,
                    reason: UnavailableReason::Pending(status),
                }),
            };
        }

        if self.status.is_terminal() {
            return Ok(false);
        }

        let changed = match update {
            JobUpdate::Stage { status, progress } => {
                if status.is_terminal() {
                    return Ok(false);
                }
                // A later backend in a chain restarts at its own early stages
                let status = if status.rank() < self.status.rank() {
                    self.status
                } else {
                    status
                };
                let progress = self.progress.max(progress.min(MAX_RUNNING_PROGRESS));
                let changed = status != self.status || progress != self.progress;
                self.status = status;
                self.progress = progress;
                changed
            }
            JobUpdate::Progress(progress) => {
                let progress = self.progress.max(progress.min(MAX_RUNNING_PROGRESS));
                let changed = progress != self.progress;
                self.progress = progress;
                changed
            }
            JobUpdate::Filename(name) => {
                let changed = self.filename.as_deref() != Some(name.as_str());
                self.filename = Some(name);
                changed
            }
            JobUpdate::Complete(asset) => {
                self.status = JobStatus::Completed;
                self.progress = 100;
                self.filename = Some(asset.filename().to_string());
                self.result_location = Some(asset);
                true
            }
            JobUpdate::Fail(detail) => {
                self.status = JobStatus::Error;
                self.error_detail = Some(detail);
                true
            }
            JobUpdate::Delivered(_) => false,
        };

        if changed {
            self.updated_at = now;
        }
        Ok(changed)
    }

    /// Read-only view handed out to pollers
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            status: self.status,
            progress: self.progress,
            filename: self.filename.clone(),
            error: self.error_detail.clone(),
            download_url: match &self.result_location {
                Some(Asset::Remote { url, .. }) => Some(url.clone()),
                _ => None,
            },
            url: self.url.clone(),
            quality: self.quality.to_string(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            delivered: self.delivered_at.is_some(),
        }
    }
}

/// Point-in-time copy of a job, as returned by the status endpoint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    /// Job id
    pub id: JobId,
    /// Current status
    pub status: JobStatus,
    /// Progress percentage
    pub progress: u8,
    /// Display filename, once known
    pub filename: Option<String>,
    /// Failure cause when status is `error`
    pub error: Option<String>,
    /// External asset URL when the result is a redirect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Submitted URL
    pub url: String,
    /// Effective quality
    pub quality: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
    /// Whether the result has been fetched at least once
    pub delivered: bool,
}

/// Store update result: the record after the update and whether it changed
#[derive(Clone, Debug)]
pub struct UpdateOutcome {
    /// Job after applying the update
    pub job: Job,
    /// False when the update was ignored
    pub changed: bool,
}

/// Video metadata returned by `POST /api/video-info`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    /// Video title
    pub title: String,
    /// Channel / uploader name
    pub author: String,
    /// Duration in seconds (0 when unknown)
    pub length_seconds: u64,
    /// View count (0 when unknown)
    pub view_count: u64,
    /// Description text
    pub description: String,
    /// Thumbnail URL
    pub thumbnail: String,
    /// Offered qualities, highest first (e.g. "1080p")
    pub qualities: Vec<String>,
}

impl VideoInfo {
    /// Basic info synthesised from a video id when no backend can describe it
    pub fn from_video_id(video_id: &str) -> Self {
        Self {
            title: format!("YouTube Video {video_id}"),
            author: "YouTube Channel".to_string(),
            length_seconds: 0,
            view_count: 0,
            description: "Video available for download".to_string(),
            thumbnail: format!("https://img.youtube.com/vi/{video_id}/maxresdefault.jpg"),
            qualities: crate::quality::DEFAULT_QUALITY_LABELS
                .iter()
                .map(|q| q.to_string())
                .collect(),
        }
    }
}

/// Event emitted during the job lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job accepted
    Queued {
        /// Job id
        id: JobId,
        /// Submitted URL
        url: String,
    },
    /// Intermediate status/progress change
    Progress {
        /// Job id
        id: JobId,
        /// Current status
        status: JobStatus,
        /// Progress percentage
        progress: u8,
    },
    /// Job reached `completed`
    Completed {
        /// Job id
        id: JobId,
        /// Display filename
        filename: String,
    },
    /// Job reached `error`
    Failed {
        /// Job id
        id: JobId,
        /// Failure cause
        error: String,
    },
    /// Result fetched for the first time
    Delivered {
        /// Job id
        id: JobId,
    },
    /// Job record reclaimed
    Removed {
        /// Job id
        id: JobId,
    },
    /// Server is shutting down
    Shutdown,
}

impl Event {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            Event::Queued { .. } => "queued",
            Event::Progress { .. } => "progress",
            Event::Completed { .. } => "completed",
            Event::Failed { .. } => "failed",
            Event::Delivered { .. } => "delivered",
            Event::Removed { .. } => "removed",
            Event::Shutdown => "shutdown",
        }
    }
}

/// Capabilities of the configured backend, reported by the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Capabilities {
    /// Backend name (e.g. "chain[cobalt, yt-dlp]")
    pub backend: String,
    /// Can describe videos
    pub video_info: bool,
    /// Can produce downloadable assets
    pub fetch: bool,
}
