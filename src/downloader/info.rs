//! Video metadata lookups.

use crate::error::{Error, Result};
use crate::types::VideoInfo;
use crate::utils::{extract_video_id, is_valid_video_url};

use super::Downloader;

impl Downloader {
    /// Describe a video without starting a job
    ///
    /// Asks the backend first. If it cannot describe the video but an id can
    /// be read from the URL, basic info derived from the id is returned.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` if the URL is not a recognised video URL
    /// - `Error::Backend` if the backend failed and no id could be extracted
    pub async fn video_info(&self, url: &str) -> Result<VideoInfo> {
        let url = url.trim();
        if !is_valid_video_url(url) {
            return Err(Error::InvalidInput(
                "URL is not a recognised video URL".to_string(),
            ));
        }

        match self.backend.video_info(url).await {
            Ok(info) => Ok(info),
            Err(e) => match extract_video_id(url) {
                Some(video_id) => {
                    tracing::warn!(
                        video_id = %video_id,
                        error = %e,
                        "backend could not describe video, using basic info"
                    );
                    Ok(VideoInfo::from_video_id(&video_id))
                }
                None => Err(Error::Backend(e)),
            },
        }
    }
}
