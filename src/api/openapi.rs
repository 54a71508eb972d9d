//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the tubeproxy REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the tubeproxy REST API
///
/// The spec can be accessed via:
/// - `/api/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "tubeproxy REST API",
        version = "0.1.0",
        description = "Submit video URLs, poll job status and fetch the resulting file or redirect",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Jobs
        crate::api::routes::start_download,
        crate::api::routes::download_status,
        crate::api::routes::list_downloads,
        crate::api::routes::cancel_download,
        crate::api::routes::download_file,

        // Info
        crate::api::routes::video_info,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::JobId,
        crate::types::JobStatus,
        crate::types::JobSnapshot,
        crate::types::VideoInfo,
        crate::types::Event,
        crate::types::Capabilities,

        // Request/response types from routes
        crate::api::routes::VideoInfoRequest,
        crate::api::routes::DownloadRequest,
        crate::api::routes::VideoInfoResponse,
        crate::api::routes::DownloadStartedResponse,
        crate::api::routes::StatusResponse,
        crate::api::routes::JobListResponse,
        crate::api::routes::MessageResponse,
        crate::api::routes::HealthResponse,

        // Errors
        crate::error::ApiError,
    )),
    tags(
        (name = "jobs", description = "Job submission, status and result delivery"),
        (name = "info", description = "Video metadata"),
        (name = "system", description = "Health, events and API documentation")
    )
)]
pub struct ApiDoc;
