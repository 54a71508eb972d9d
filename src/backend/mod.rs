//! Fetch/extract backends
//!
//! A backend turns a video URL into either a direct asset URL or a file in
//! the download directory. The core abstraction is the [`Backend`] trait;
//! several implementations are provided:
//!
//! - [`CobaltBackend`]: asks a Cobalt relay for a direct asset URL
//! - [`YtDlpBackend`]: runs the external `yt-dlp` binary and keeps the file locally
//! - [`OembedBackend`]: metadata only, via the oEmbed endpoint
//! - [`MockBackend`]: deterministic fake for demos and tests
//! - [`ChainBackend`]: tries an ordered list of backends until one succeeds
//!
//! ## Usage
//!
//! ```no_run
//! use tubeproxy::backend::{Backend, YtDlpBackend};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = YtDlpBackend::from_path().expect("yt-dlp not found in PATH");
//! let info = backend
//!     .video_info("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
//!     .await?;
//! println!("{} by {}", info.title, info.author);
//! # Ok(())
//! # }
//! ```

mod chain;
mod cobalt;
mod mock;
mod oembed;
mod reporter;
mod traits;
mod ytdlp;

pub use chain::ChainBackend;
pub use cobalt::CobaltBackend;
pub use mock::MockBackend;
pub use oembed::OembedBackend;
pub use reporter::JobReporter;
pub use traits::{Backend, BackendCapabilities, FetchRequest};
pub use ytdlp::YtDlpBackend;

use crate::config::{BackendConfig, Config};
use crate::error::{Error, Result};
use std::sync::Arc;

/// Build the backend described by the configuration
///
/// The configured backends are always wrapped in a [`ChainBackend`] so each
/// attempt gets the chain's time budget; with a single entry the chain passes
/// that backend's error through unchanged.
///
/// # Errors
///
/// Returns `Error::Config` if a backend cannot be constructed (for example a
/// yt-dlp entry without a binary on `PATH`).
pub fn build_backend(config: &Config) -> Result<Arc<dyn Backend>> {
    let backends = config
        .backends
        .iter()
        .map(build_one)
        .collect::<Result<Vec<_>>>()?;

    let chain = ChainBackend::new(backends, config.chain.attempt_timeout);
    tracing::info!(backend = chain.name(), "backend configured");
    Ok(Arc::new(chain))
}

fn build_one(config: &BackendConfig) -> Result<Arc<dyn Backend>> {
    let backend: Arc<dyn Backend> = match config {
        BackendConfig::Cobalt(cobalt) => Arc::new(CobaltBackend::new(cobalt).map_err(|e| {
            Error::Config {
                message: format!("cobalt backend: {e}"),
                key: Some("backends".to_string()),
            }
        })?),
        BackendConfig::YtDlp(ytdlp) => {
            Arc::new(YtDlpBackend::from_config(ytdlp).ok_or_else(|| Error::Config {
                message: "yt-dlp binary not configured and not found in PATH".to_string(),
                key: Some("backends".to_string()),
            })?)
        }
        BackendConfig::Oembed(oembed) => Arc::new(OembedBackend::new(oembed).map_err(|e| {
            Error::Config {
                message: format!("oembed backend: {e}"),
                key: Some("backends".to_string()),
            }
        })?),
        BackendConfig::Mock(mock) => Arc::new(MockBackend::from_config(mock)),
    };
    Ok(backend)
}
