//! Mock backend producing fake metadata and assets

use super::traits::{Backend, BackendCapabilities, FetchRequest};
use super::JobReporter;
use crate::config::{MockConfig, MockOutcome};
use crate::error::BackendError;
use crate::types::{Asset, JobStatus, VideoInfo};
use crate::utils::extract_video_id;
use async_trait::async_trait;
use std::time::Duration;

const NAME: &str = "mock";

/// Backend that fakes everything
///
/// Useful for demos without network access and for exercising the job
/// lifecycle in tests: the outcome and the pause before each stage are
/// configurable.
#[derive(Debug, Clone)]
pub struct MockBackend {
    outcome: MockOutcome,
    stage_delay: Duration,
}

impl MockBackend {
    /// Create a mock with the given outcome and per-stage delay
    pub fn new(outcome: MockOutcome, stage_delay: Duration) -> Self {
        Self {
            outcome,
            stage_delay,
        }
    }

    /// Create a mock from configuration
    pub fn from_config(config: &MockConfig) -> Self {
        Self::new(
            config.outcome.clone(),
            Duration::from_millis(config.stage_delay_ms),
        )
    }

    async fn pause(&self) {
        if !self.stage_delay.is_zero() {
            tokio::time::sleep(self.stage_delay).await;
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        NAME
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            can_describe: true,
            can_fetch: true,
        }
    }

    async fn video_info(&self, url: &str) -> Result<VideoInfo, BackendError> {
        let video_id = extract_video_id(url).unwrap_or_else(|| "mock".to_string());
        Ok(VideoInfo {
            title: format!("Mock Video {video_id}"),
            author: "Mock Channel".to_string(),
            length_seconds: 212,
            view_count: 1_000_000,
            description: "Mocked video information".to_string(),
            ..VideoInfo::from_video_id(&video_id)
        })
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        reporter: &JobReporter,
    ) -> Result<Asset, BackendError> {
        self.pause().await;
        reporter.stage(JobStatus::FetchingInfo, 10).await?;

        self.pause().await;
        reporter.stage(JobStatus::Downloading, 50).await?;

        self.pause().await;
        let filename = format!("video_{}.{}", request.job_id, request.quality.extension());
        match &self.outcome {
            MockOutcome::Redirect { url } => Ok(Asset::Remote {
                url: url.clone(),
                filename,
            }),
            MockOutcome::File { size_bytes } => {
                let io_err = |e: std::io::Error| BackendError::Process {
                    backend: NAME.to_string(),
                    message: e.to_string(),
                };
                tokio::fs::create_dir_all(&request.download_dir)
                    .await
                    .map_err(io_err)?;
                let path = request.download_dir.join(&filename);
                tokio::fs::write(&path, vec![0u8; *size_bytes])
                    .await
                    .map_err(io_err)?;
                reporter.progress(90).await?;
                Ok(Asset::Local { path, filename })
            }
            MockOutcome::Fail { message } => Err(BackendError::Rejected {
                backend: NAME.to_string(),
                message: message.clone(),
            }),
        }
    }
}
