//! Background service starters.

use crate::janitor::Janitor;
use std::sync::Arc;

use super::Downloader;

impl Downloader {
    /// Start the janitor background task
    ///
    /// The task stops on its own once [`shutdown`](Downloader::shutdown) completes.
    pub fn start_janitor(&self) -> tokio::task::JoinHandle<()> {
        let janitor = Janitor::new(Arc::new(self.clone()));

        let handle = tokio::spawn(async move {
            janitor.run().await;
        });

        tracing::info!(
            interval_secs = self.config.jobs.janitor_interval.as_secs(),
            "Janitor background task started"
        );

        handle
    }
}
