//! oEmbed metadata backend

use super::traits::{Backend, BackendCapabilities, FetchRequest};
use super::JobReporter;
use crate::config::OembedConfig;
use crate::error::BackendError;
use crate::quality::DEFAULT_QUALITY_LABELS;
use crate::types::{Asset, VideoInfo};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const NAME: &str = "oembed";

/// Metadata-only backend using the public oEmbed endpoint
///
/// oEmbed gives a title, channel name and thumbnail without any API key.
/// It cannot produce assets; `fetch` is always unsupported, so in a fallback
/// chain it only ever answers video-info lookups.
pub struct OembedBackend {
    client: reqwest::Client,
    endpoint: String,
    request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct OembedResponse {
    title: String,
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

impl OembedBackend {
    /// Create a backend for the configured endpoint
    pub fn new(config: &OembedConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BackendError::Request {
                backend: NAME.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            request_timeout: config.request_timeout,
        })
    }

    fn transport_error(&self, e: &reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout {
                backend: NAME.to_string(),
                after: self.request_timeout,
            }
        } else {
            BackendError::Request {
                backend: NAME.to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Backend for OembedBackend {
    fn name(&self) -> &str {
        NAME
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            can_describe: true,
            can_fetch: false,
        }
    }

    async fn video_info(&self, url: &str) -> Result<VideoInfo, BackendError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", url), ("format", "json")])
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Http {
                backend: NAME.to_string(),
                status: status.as_u16(),
            });
        }

        let body: OembedResponse = response.json().await.map_err(|e| BackendError::Parse {
            backend: NAME.to_string(),
            message: e.to_string(),
        })?;

        Ok(VideoInfo {
            title: body.title,
            author: body.author_name.unwrap_or_default(),
            length_seconds: 0,
            view_count: 0,
            description: String::new(),
            thumbnail: body.thumbnail_url.unwrap_or_default(),
            qualities: DEFAULT_QUALITY_LABELS.iter().map(|q| q.to_string()).collect(),
        })
    }

    async fn fetch(
        &self,
        _request: &FetchRequest,
        _reporter: &JobReporter,
    ) -> Result<Asset, BackendError> {
        Err(BackendError::Unsupported {
            backend: NAME.to_string(),
            operation: "fetch".to_string(),
        })
    }
}
