//! Application state for the API server

use crate::{Config, Downloader};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the orchestrator and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The job orchestrator
    pub downloader: Arc<Downloader>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(downloader: Arc<Downloader>, config: Arc<Config>) -> Self {
        Self { downloader, config }
    }
}
