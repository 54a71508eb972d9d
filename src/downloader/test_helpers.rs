//! Shared test helpers for creating Downloader instances in tests.

use crate::backend::{Backend, BackendCapabilities, FetchRequest, JobReporter, MockBackend};
use crate::config::{BackendConfig, Config, MockConfig, MockOutcome};
use crate::downloader::Downloader;
use crate::error::BackendError;
use crate::store::MemoryJobStore;
use crate::types::{Asset, JobId, JobSnapshot, JobStatus, VideoInfo};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{TempDir, tempdir};

/// A URL every validator in the crate accepts
pub(crate) const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Config pointing the download directory into `temp_dir`, with a mock backend
pub(crate) fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.jobs.download_dir = temp_dir.path().join("downloads");
    config.backends = vec![BackendConfig::Mock(MockConfig::default())];
    config
}

/// Helper to create a test Downloader backed by an instant redirecting mock.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) async fn create_test_downloader() -> (Downloader, TempDir) {
    let backend = Arc::new(MockBackend::new(MockOutcome::default(), Duration::ZERO));
    create_test_downloader_with(backend, |_| {}).await
}

/// Helper to create a test Downloader with a specific backend and config tweaks
pub(crate) async fn create_test_downloader_with(
    backend: Arc<dyn Backend>,
    tweak: impl FnOnce(&mut Config),
) -> (Downloader, TempDir) {
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(&temp_dir);
    tweak(&mut config);

    let downloader =
        Downloader::with_components(config, Arc::new(MemoryJobStore::new()), backend)
            .await
            .unwrap();
    (downloader, temp_dir)
}

/// Mock backend with the given outcome and no delays
pub(crate) fn mock(outcome: MockOutcome) -> Arc<dyn Backend> {
    Arc::new(MockBackend::new(outcome, Duration::ZERO))
}

/// Poll until the job is terminal, failing the test after five seconds
pub(crate) async fn wait_for_terminal(downloader: &Downloader, id: JobId) -> JobSnapshot {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = downloader.get_status(id).await.unwrap();
            if snapshot.status.is_terminal() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job did not reach a terminal state")
}

/// Poll until the job reports `status`, failing the test after five seconds
pub(crate) async fn wait_for_status(downloader: &Downloader, id: JobId, status: JobStatus) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while downloader.get_status(id).await.unwrap().status != status {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job never reached the expected status");
}

/// Backend that reports one stage and then never finishes
///
/// It cannot describe videos either, which exercises the basic-info fallback.
pub(crate) struct HangingBackend;

#[async_trait]
impl Backend for HangingBackend {
    fn name(&self) -> &str {
        "hanging"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            can_describe: false,
            can_fetch: true,
        }
    }

    async fn video_info(&self, _url: &str) -> Result<VideoInfo, BackendError> {
        Err(BackendError::Unsupported {
            backend: "hanging".into(),
            operation: "video_info".into(),
        })
    }

    async fn fetch(
        &self,
        _request: &FetchRequest,
        reporter: &JobReporter,
    ) -> Result<Asset, BackendError> {
        reporter.stage(JobStatus::FetchingInfo, 10).await?;
        std::future::pending().await
    }
}
