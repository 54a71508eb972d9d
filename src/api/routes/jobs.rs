//! Job handlers: submit, status, list, cancel and result delivery.

use super::{
    DownloadRequest, DownloadStartedResponse, JobListResponse, MessageResponse, StatusResponse,
    parse_job_id,
};
use crate::api::AppState;
use crate::downloader::Delivery;
use crate::error::{Error, Result, UnavailableReason};
use axum::{
    Json,
    body::Body,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

/// POST /api/download - Start a download job
#[utoipa::path(
    post,
    path = "/api/download",
    tag = "jobs",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Job started", body = DownloadStartedResponse),
        (status = 400, description = "Invalid URL or body", body = crate::error::ApiError),
        (status = 503, description = "Server is shutting down", body = crate::error::ApiError)
    )
)]
pub async fn start_download(
    State(state): State<AppState>,
    body: std::result::Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Json<DownloadStartedResponse>> {
    let Json(request) = body?;
    let id = state
        .downloader
        .submit(&request.url, request.quality.as_deref())
        .await?;

    Ok(Json(DownloadStartedResponse {
        success: true,
        download_id: id,
        message: "Download started".to_string(),
    }))
}

/// GET /api/download-status/:id - Poll a job
#[utoipa::path(
    get,
    path = "/api/download-status/{id}",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Job id")
    ),
    responses(
        (status = 200, description = "Current job state", body = StatusResponse),
        (status = 404, description = "Unknown or expired job", body = crate::error::ApiError)
    )
)]
pub async fn download_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>> {
    let status = state.downloader.get_status(parse_job_id(&id)?).await?;
    Ok(Json(StatusResponse {
        success: true,
        status,
    }))
}

/// GET /api/downloads - List live jobs
#[utoipa::path(
    get,
    path = "/api/downloads",
    tag = "jobs",
    responses(
        (status = 200, description = "All live jobs, oldest first", body = JobListResponse)
    )
)]
pub async fn list_downloads(State(state): State<AppState>) -> Result<Json<JobListResponse>> {
    let downloads = state.downloader.list().await?;
    Ok(Json(JobListResponse {
        success: true,
        downloads,
    }))
}

/// DELETE /api/download/:id - Cancel a running job
#[utoipa::path(
    delete,
    path = "/api/download/{id}",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Job id")
    ),
    responses(
        (status = 200, description = "Job cancelled", body = MessageResponse),
        (status = 404, description = "Unknown or expired job", body = crate::error::ApiError),
        (status = 409, description = "Job already finished", body = crate::error::ApiError)
    )
)]
pub async fn cancel_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.downloader.cancel(parse_job_id(&id)?).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Download cancelled".to_string(),
    }))
}

/// GET /api/file/:id - Fetch a completed job's result
#[utoipa::path(
    get,
    path = "/api/file/{id}",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Job id")
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 302, description = "Redirect to the external asset URL"),
        (status = 404, description = "Unknown job, or result not available", body = crate::error::ApiError)
    )
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_job_id(&id)?;

    match state.downloader.deliver(id).await? {
        Delivery::Redirect { url } => {
            let location = HeaderValue::from_str(&url).map_err(|e| {
                Error::Other(format!("result URL is not a valid header value: {e}"))
            })?;
            Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
        }
        Delivery::File { path, filename } => {
            let file = match tokio::fs::File::open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(Error::ResultUnavailable {
                        id,
                        reason: UnavailableReason::FileMissing,
                    });
                }
                Err(e) => return Err(e.into()),
            };
            let length = file.metadata().await?.len();
            let content_type = mime_guess::from_path(&filename).first_or_octet_stream();

            tracing::debug!(job_id = %id, path = %path.display(), bytes = length, "streaming result file");

            Ok((
                [
                    (header::CONTENT_TYPE, content_type.essence_str().to_string()),
                    (header::CONTENT_LENGTH, length.to_string()),
                    (header::CONTENT_DISPOSITION, content_disposition(&filename)),
                ],
                Body::from_stream(ReaderStream::new(file)),
            )
                .into_response())
        }
    }
}

/// `attachment` disposition carrying the display filename
fn content_disposition(filename: &str) -> String {
    let escaped: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' { '\'' } else { c })
        .collect();
    format!("attachment; filename=\"{escaped}\"")
}
