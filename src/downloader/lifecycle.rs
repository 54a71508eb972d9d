//! Shutdown coordination.

use crate::types::Event;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::Downloader;

/// How long shutdown waits for running jobs to wind down
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl Downloader {
    /// Gracefully shut down the orchestrator
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new submissions
    /// 2. Cancels all running jobs (using their cancellation tokens)
    /// 3. Waits for the driving tasks to finish, with a timeout (30 seconds)
    /// 4. Stops the janitor and pending grace-delay cleanups
    ///
    /// Job records are not persisted, so nothing is written on the way out.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new jobs
        self.task_state.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new jobs");

        // 2. Cancel all running jobs
        self.cancel_all_active().await;

        // 3. Wait for driving tasks to finish with timeout
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait_for_active_jobs()).await {
            Ok(()) => tracing::info!("All running jobs finished"),
            Err(_) => {
                tracing::warn!("Timeout waiting for running jobs to finish, proceeding with shutdown");
            }
        }

        // 4. Stop background work
        self.task_state.shutdown.cancel();

        // No subscribers is fine
        let _ = self.event_tx.send(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
    }

    /// Whether new submissions are accepted
    pub fn is_accepting(&self) -> bool {
        self.task_state.accepting_new.load(Ordering::SeqCst)
    }

    /// Token cancelled once shutdown completes
    pub fn shutdown_token(&self) -> tokio_util::sync::CancellationToken {
        self.task_state.shutdown.clone()
    }

    async fn cancel_all_active(&self) {
        let active = self.task_state.active_jobs.lock().await;
        tracing::debug!(active_count = active.len(), "Cancelling all running jobs");

        for (id, token) in active.iter() {
            tracing::debug!(job_id = %id, "Signaling cancellation");
            token.cancel();
        }
    }

    async fn wait_for_active_jobs(&self) {
        loop {
            let active_count = self.task_state.active_jobs.lock().await.len();
            if active_count == 0 {
                return;
            }

            tracing::debug!(active_count, "Waiting for running jobs to finish");
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
