//! Video metadata handler.

use super::{VideoInfoRequest, VideoInfoResponse};
use crate::api::AppState;
use crate::error::Result;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

/// POST /api/video-info - Describe a video without starting a job
#[utoipa::path(
    post,
    path = "/api/video-info",
    tag = "info",
    request_body = VideoInfoRequest,
    responses(
        (status = 200, description = "Video metadata", body = VideoInfoResponse),
        (status = 400, description = "Invalid URL or body", body = crate::error::ApiError),
        (status = 502, description = "Backend could not describe the video", body = crate::error::ApiError)
    )
)]
pub async fn video_info(
    State(state): State<AppState>,
    body: std::result::Result<Json<VideoInfoRequest>, JsonRejection>,
) -> Result<Json<VideoInfoResponse>> {
    let Json(request) = body?;
    let info = state.downloader.video_info(&request.url).await?;
    Ok(Json(VideoInfoResponse {
        success: true,
        info,
    }))
}
