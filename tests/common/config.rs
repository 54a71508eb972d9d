//! Test configuration helpers for creating orchestrators over temporary directories

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tubeproxy::backend::MockBackend;
use tubeproxy::config::{BackendConfig, MockConfig, MockOutcome};
use tubeproxy::{Backend, Config, Downloader, MemoryJobStore};

/// Default configuration rooted in `temp_dir`, with a mock backend entry
pub fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.jobs.download_dir = temp_dir.path().join("downloads");
    config.server.static_dir = temp_dir.path().join("public");
    config.backends = vec![BackendConfig::Mock(MockConfig::default())];
    config
}

/// Mock backend with the given outcome and no stage delay
pub fn mock_backend(outcome: MockOutcome) -> Arc<dyn Backend> {
    Arc::new(MockBackend::new(outcome, Duration::ZERO))
}

/// Create an orchestrator over `backend`, after applying `tweak` to the default test config
pub async fn create_downloader(
    backend: Arc<dyn Backend>,
    tweak: impl FnOnce(&mut Config),
) -> (Arc<Downloader>, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = test_config(&temp_dir);
    tweak(&mut config);

    let downloader = Downloader::with_components(config, Arc::new(MemoryJobStore::new()), backend)
        .await
        .expect("Failed to create downloader");
    (Arc::new(downloader), temp_dir)
}
