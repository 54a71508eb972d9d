//! # tubeproxy
//!
//! Web-facing video download proxy with asynchronous job tracking.
//!
//! A caller submits a video URL and immediately gets an opaque job id back.
//! A backend (a Cobalt relay, the `yt-dlp` tool, or a fallback chain of them)
//! resolves the video in the background while the caller polls the job's
//! status. Once the job completes, the result is delivered either as a
//! redirect to an external URL or as a file streamed from the download
//! directory, and the job is cleaned up shortly afterwards. A periodic
//! janitor reclaims anything that is never fetched.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tubeproxy::{Config, Downloader};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = Downloader::new(Config::default()).await?;
//!
//!     let id = downloader
//!         .submit("https://www.youtube.com/watch?v=dQw4w9WgXcQ", Some("720p"))
//!         .await?;
//!
//!     loop {
//!         let status = downloader.get_status(id).await?;
//!         println!("{}: {}%", status.status, status.progress);
//!         if status.status.is_terminal() {
//!             break;
//!         }
//!         tokio::time::sleep(Duration::from_millis(500)).await;
//!     }
//!
//!     let result = downloader.deliver(id).await?;
//!     println!("{:?}", result);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Fetch/extract backends
pub mod backend;
/// Configuration types
pub mod config;
/// Job orchestration (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Periodic cleanup of stale jobs and files
pub mod janitor;
/// Requested quality and resolution selection
pub mod quality;
/// Job record storage
pub mod store;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use backend::{Backend, BackendCapabilities, ChainBackend, FetchRequest, JobReporter};
pub use config::Config;
pub use downloader::{Delivery, Downloader};
pub use error::{ApiError, BackendError, Error, Result, ToHttpStatus, UnavailableReason};
pub use janitor::{Janitor, SweepReport};
pub use quality::Quality;
pub use store::{JobStore, MemoryJobStore};
pub use types::{Asset, Event, Job, JobId, JobSnapshot, JobStatus, JobUpdate, VideoInfo};

/// Resolve once the process is asked to stop
///
/// Waits for Ctrl+C, and on unix also for SIGTERM. A handler that cannot be
/// installed is logged and ignored.
pub async fn wait_for_signal() {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = interrupt => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
