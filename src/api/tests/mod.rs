use super::*;
use crate::backend::Backend;
use crate::config::MockOutcome;
use crate::downloader::test_helpers::{
    HangingBackend, VIDEO_URL, create_test_downloader_with, mock, wait_for_status,
    wait_for_terminal,
};
use crate::types::JobStatus;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

mod system;

/// Router over a downloader with the given backend, plus the downloader for direct inspection
async fn create_test_app(
    backend: Arc<dyn Backend>,
    tweak: impl FnOnce(&mut Config),
) -> (Router, Arc<Downloader>, TempDir) {
    let (downloader, temp_dir) = create_test_downloader_with(backend, tweak).await;
    let downloader = Arc::new(downloader);
    let app = create_router(downloader.clone(), downloader.get_config());
    (app, downloader, temp_dir)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, _, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, _, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_api_server_stops_on_signal() {
    let (downloader, _temp_dir) = create_test_downloader_with(mock(MockOutcome::default()), |c| {
        // Port 0 = OS assigns a free port
        c.server.bind_address = "127.0.0.1:0".parse().unwrap();
    })
    .await;
    let downloader = Arc::new(downloader);
    let config = downloader.get_config();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(start_api_server_with_shutdown(downloader, config, async {
        let _ = rx.await;
    }));
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let (app, _downloader, _temp_dir) = create_test_app(mock(MockOutcome::default()), |c| {
        c.server.cors_enabled = true;
        c.server.cors_origins = vec!["*".to_string()];
    })
    .await;

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://localhost:8080")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (app, _downloader, _temp_dir) =
        create_test_app(mock(MockOutcome::default()), |c| c.server.cors_enabled = false).await;

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://localhost:8080")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, request).await;

    assert!(headers.get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_swagger_ui_enabled() {
    let (app, _downloader, _temp_dir) =
        create_test_app(mock(MockOutcome::default()), |c| c.server.swagger_ui = true).await;

    let request = Request::builder()
        .uri("/swagger-ui/")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("<html") || body.contains("<!DOCTYPE html>"));
}

#[tokio::test]
async fn test_swagger_ui_disabled() {
    let (app, _downloader, _temp_dir) =
        create_test_app(mock(MockOutcome::default()), |c| c.server.swagger_ui = false).await;

    let request = Request::builder()
        .uri("/swagger-ui/")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_landing_page_served_from_static_dir() {
    let static_dir = TempDir::new().unwrap();
    std::fs::write(
        static_dir.path().join("index.html"),
        "<html><body>tubeproxy landing</body></html>",
    )
    .unwrap();
    let static_path = static_dir.path().to_path_buf();
    let (app, _downloader, _temp_dir) = create_test_app(mock(MockOutcome::default()), move |c| {
        c.server.static_dir = static_path;
    })
    .await;

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body.to_vec()).unwrap().contains("tubeproxy landing"));
}
