use super::*;
use crate::types::Event;

#[tokio::test]
async fn test_health_check() {
    let (app, _downloader, _temp_dir) = create_test_app(mock(MockOutcome::default()), |_| {}).await;

    let (status, body) = get_json(&app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["backend"], "mock");
    assert_eq!(body["capabilities"]["fetch"], true);
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let (app, _downloader, _temp_dir) = create_test_app(mock(MockOutcome::default()), |_| {}).await;

    let (status, body) = get_json(&app, "/api/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["openapi"].as_str().unwrap().starts_with("3."));
    assert_eq!(body["info"]["title"], "tubeproxy REST API");
    assert!(body["paths"]["/api/download"].is_object());
}

#[tokio::test]
async fn test_sse_event_stream() {
    let (app, downloader, _temp_dir) = create_test_app(mock(MockOutcome::default()), |_| {}).await;

    let request = Request::builder()
        .uri("/api/events")
        .header("Accept", "text/event-stream")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(content_type.contains("text/event-stream"));

    // The stream is subscribed, so an emitted event is delivered to it
    let mut receiver = downloader.subscribe();
    downloader.emit(Event::Shutdown);
    assert!(matches!(receiver.recv().await.unwrap(), Event::Shutdown));
}

#[tokio::test]
async fn test_unknown_api_path_is_not_found() {
    let (app, _downloader, _temp_dir) = create_test_app(mock(MockOutcome::default()), |_| {}).await;

    let request = Request::builder()
        .uri("/api/nope")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
