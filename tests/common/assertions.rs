//! Custom test assertions for integration tests

use std::time::Duration;
use tubeproxy::{Downloader, Event, JobId, JobSnapshot};

/// Result of waiting for a job to finish
#[derive(Debug)]
pub enum WaitResult {
    /// Job completed successfully
    Completed,
    /// Job failed with error
    Failed(String),
    /// Timeout waiting for completion
    Timeout,
    /// Channel closed unexpectedly
    ChannelClosed,
}

/// Wait for a job to reach a terminal state by listening to events
///
/// Subscribe before submitting, or the terminal event may be missed.
pub async fn wait_for_completion(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    id: JobId,
    timeout: Duration,
) -> WaitResult {
    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(Event::Completed { id: event_id, .. }) if event_id == id => {
                    return WaitResult::Completed;
                }
                Ok(Event::Failed {
                    id: event_id,
                    error,
                }) if event_id == id => {
                    return WaitResult::Failed(error);
                }
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(_) => return WaitResult::ChannelClosed,
            }
        }
    })
    .await;

    result.unwrap_or(WaitResult::Timeout)
}

/// Poll the status query until the job is terminal, asserting progress never decreases
pub async fn poll_until_terminal(
    downloader: &Downloader,
    id: JobId,
    timeout: Duration,
) -> JobSnapshot {
    tokio::time::timeout(timeout, async {
        let mut last_progress = 0;
        loop {
            let snapshot = downloader
                .get_status(id)
                .await
                .expect("job disappeared while polling");
            assert!(
                snapshot.progress >= last_progress,
                "progress went from {} to {}",
                last_progress,
                snapshot.progress
            );
            last_progress = snapshot.progress;
            if snapshot.status.is_terminal() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job did not reach a terminal state in time")
}
