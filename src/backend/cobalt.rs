//! Cobalt relay backend

use super::traits::{Backend, BackendCapabilities, FetchRequest};
use super::JobReporter;
use crate::config::CobaltConfig;
use crate::error::BackendError;
use crate::quality::Quality;
use crate::types::{Asset, JobStatus, VideoInfo};
use crate::utils::extract_video_id;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NAME: &str = "cobalt";

/// Backend that asks a Cobalt relay for a direct asset URL
///
/// The relay does the actual extraction; this backend only forwards the URL
/// and the requested quality and returns whatever link the relay hands back.
/// Nothing is written locally, so results are always delivered by redirect.
pub struct CobaltBackend {
    client: reqwest::Client,
    api_url: String,
    request_timeout: Duration,
}

impl CobaltBackend {
    /// Create a backend for the configured relay endpoint
    pub fn new(config: &CobaltConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| request_error(&e))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            request_timeout: config.request_timeout,
        })
    }

    async fn call(&self, body: &CobaltRequest<'_>) -> Result<CobaltResponse, BackendError> {
        let response = self
            .client
            .post(&self.api_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            // The relay explains refusals in the body even on 4xx/5xx
            return Err(match serde_json::from_str::<CobaltResponse>(&text) {
                Ok(parsed) if parsed.error_message().is_some() => BackendError::Rejected {
                    backend: NAME.to_string(),
                    message: parsed.error_message().unwrap_or_default(),
                },
                _ => BackendError::Http {
                    backend: NAME.to_string(),
                    status: status.as_u16(),
                },
            });
        }

        serde_json::from_str(&text).map_err(|e| BackendError::Parse {
            backend: NAME.to_string(),
            message: e.to_string(),
        })
    }

    fn transport_error(&self, e: &reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout {
                backend: NAME.to_string(),
                after: self.request_timeout,
            }
        } else {
            request_error(e)
        }
    }
}

fn request_error(e: &reqwest::Error) -> BackendError {
    BackendError::Request {
        backend: NAME.to_string(),
        message: e.to_string(),
    }
}

/// Request body understood by the relay
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CobaltRequest<'a> {
    url: &'a str,
    download_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    youtube_video_format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    youtube_video_quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    youtube_audio_format: Option<&'static str>,
}

impl<'a> CobaltRequest<'a> {
    fn probe(url: &'a str) -> Self {
        Self {
            url,
            download_mode: "auto",
            youtube_video_format: None,
            youtube_video_quality: None,
            youtube_audio_format: None,
        }
    }

    fn for_quality(url: &'a str, quality: Quality) -> Self {
        match quality {
            Quality::Audio => Self {
                download_mode: "audio",
                youtube_audio_format: Some("mp3"),
                ..Self::probe(url)
            },
            Quality::Best => Self {
                youtube_video_format: Some("mp4"),
                ..Self::probe(url)
            },
            Quality::Resolution(height) => Self {
                youtube_video_format: Some("mp4"),
                youtube_video_quality: Some(height.to_string()),
                ..Self::probe(url)
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct CobaltResponse {
    status: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    picker: Vec<PickerItem>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<CobaltErrorBody>,
}

#[derive(Debug, Deserialize)]
struct PickerItem {
    url: String,
}

#[derive(Debug, Deserialize)]
struct CobaltErrorBody {
    code: String,
}

impl CobaltResponse {
    fn error_message(&self) -> Option<String> {
        self.text
            .clone()
            .or_else(|| self.error.as_ref().map(|e| e.code.clone()))
    }

    fn is_success(&self) -> bool {
        matches!(
            self.status.as_str(),
            "success" | "stream" | "redirect" | "tunnel" | "picker"
        )
    }

    /// Pull the downloadable URL out of a response
    fn into_asset_url(self) -> Result<String, BackendError> {
        match self.status.as_str() {
            "success" | "stream" | "redirect" | "tunnel" => {
                self.url.ok_or_else(|| BackendError::NoAsset {
                    backend: NAME.to_string(),
                })
            }
            "picker" => self
                .picker
                .into_iter()
                .next()
                .map(|item| item.url)
                .ok_or_else(|| BackendError::NoAsset {
                    backend: NAME.to_string(),
                }),
            "error" => Err(BackendError::Rejected {
                backend: NAME.to_string(),
                message: self
                    .error_message()
                    .unwrap_or_else(|| "unknown error".to_string()),
            }),
            _ => Err(BackendError::NoAsset {
                backend: NAME.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Backend for CobaltBackend {
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
        let response = self.call(&CobaltRequest::probe(url)).await?;
        if !response.is_success() {
            return Err(BackendError::Rejected {
                backend: NAME.to_string(),
                message: response
                    .error_message()
                    .unwrap_or_else(|| "relay cannot access this video".to_string()),
            });
        }

        // The relay only confirms the video is reachable; metadata is synthesised
        let video_id = extract_video_id(url).ok_or_else(|| BackendError::Parse {
            backend: NAME.to_string(),
            message: "no video id in URL".to_string(),
        })?;
        Ok(VideoInfo {
            description: "Video available for download via Cobalt".to_string(),
            ..VideoInfo::from_video_id(&video_id)
        })
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        reporter: &JobReporter,
    ) -> Result<Asset, BackendError> {
        reporter.stage(JobStatus::Downloading, 25).await?;
        let body = CobaltRequest::for_quality(&request.url, request.quality);

        reporter.progress(50).await?;
        let response = self.call(&body).await?;

        reporter.progress(75).await?;
        let url = response.into_asset_url()?;

        reporter.progress(90).await?;
        tracing::debug!(job_id = %request.job_id, "relay returned asset URL");

        Ok(Asset::Remote {
            url,
            filename: format!("video_{}.{}", request.job_id, request.quality.extension()),
        })
    }
}
