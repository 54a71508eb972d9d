use super::*;

#[tokio::test]
async fn test_submit_starts_in_processing_at_zero() {
    let backend = Arc::new(crate::backend::MockBackend::new(
        MockOutcome::default(),
        Duration::from_millis(300),
    ));
    let (downloader, _temp_dir) = create_test_downloader_with(backend, |_| {}).await;

    let id = downloader.submit(VIDEO_URL, None).await.unwrap();

    let status = downloader.get_status(id).await.unwrap();
    assert_eq!(status.status, JobStatus::Processing);
    assert_eq!(status.progress, 0);
    assert_eq!(status.url, VIDEO_URL);
    assert!(status.error.is_none());
}

#[tokio::test]
async fn test_submit_rejects_invalid_url_without_creating_job() {
    let (downloader, _temp_dir) = create_test_downloader().await;

    let err = downloader.submit("not a url", None).await.unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(downloader.list().await.unwrap().is_empty());
    assert_eq!(downloader.active_job_count().await, 0);
}

#[tokio::test]
async fn test_redirect_backend_completes_with_full_progress() {
    let backend = mock(MockOutcome::Redirect {
        url: "https://cdn.example/video.mp4".into(),
    });
    let (downloader, _temp_dir) = create_test_downloader_with(backend, |_| {}).await;

    let id = downloader.submit(VIDEO_URL, Some("720p")).await.unwrap();
    let status = wait_for_terminal(&downloader, id).await;

    assert_eq!(status.status, JobStatus::Completed);
    assert_eq!(status.progress, 100);
    assert_eq!(
        status.download_url.as_deref(),
        Some("https://cdn.example/video.mp4")
    );
    assert_eq!(status.filename, Some(format!("video_{id}.mp4")));
}

#[tokio::test]
async fn test_backend_failure_is_recorded_on_the_job() {
    let backend = mock(MockOutcome::Fail {
        message: "video unavailable".into(),
    });
    let (downloader, _temp_dir) = create_test_downloader_with(backend, |_| {}).await;

    let id = downloader.submit(VIDEO_URL, None).await.unwrap();
    let status = wait_for_terminal(&downloader, id).await;

    assert_eq!(status.status, JobStatus::Error);
    let detail = status.error.unwrap();
    assert!(detail.contains("video unavailable"), "detail was {detail}");
    // Progress freezes where the backend left it
    assert_eq!(status.progress, 50);
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let (downloader, _temp_dir) = create_test_downloader().await;

    let err = downloader.get_status(JobId::new()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn test_unrecognised_quality_uses_configured_default() {
    let (downloader, _temp_dir) = create_test_downloader_with(Arc::new(HangingBackend), |c| {
        c.jobs.default_quality = crate::quality::Quality::Resolution(480);
    })
    .await;

    let odd = downloader.submit(VIDEO_URL, Some("ultra")).await.unwrap();
    let audio = downloader.submit(VIDEO_URL, Some("AUDIO")).await.unwrap();

    assert_eq!(downloader.get_status(odd).await.unwrap().quality, "480p");
    assert_eq!(downloader.get_status(audio).await.unwrap().quality, "audio");
}

#[tokio::test]
async fn test_job_timeout_fails_job() {
    let (downloader, _temp_dir) = create_test_downloader_with(Arc::new(HangingBackend), |c| {
        c.jobs.job_timeout = Duration::from_millis(200);
        c.chain.attempt_timeout = Duration::from_millis(100);
    })
    .await;

    let id = downloader.submit(VIDEO_URL, None).await.unwrap();
    let status = wait_for_terminal(&downloader, id).await;

    assert_eq!(status.status, JobStatus::Error);
    assert!(status.error.unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_polled_progress_never_decreases() {
    let backend = Arc::new(crate::backend::MockBackend::new(
        MockOutcome::File { size_bytes: 16 },
        Duration::from_millis(40),
    ));
    let (downloader, _temp_dir) = create_test_downloader_with(backend, |_| {}).await;

    let id = downloader.submit(VIDEO_URL, None).await.unwrap();

    let mut last = 0;
    let mut seen_intermediate = false;
    loop {
        let status = downloader.get_status(id).await.unwrap();
        assert!(status.progress >= last, "progress went backwards");
        last = status.progress;
        if matches!(
            status.status,
            JobStatus::FetchingInfo | JobStatus::Downloading
        ) {
            seen_intermediate = true;
        }
        if status.status.is_terminal() {
            assert_eq!(status.status, JobStatus::Completed);
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(seen_intermediate);
    assert_eq!(last, 100);
}

#[tokio::test]
async fn test_events_follow_job_lifecycle() {
    let (downloader, _temp_dir) = create_test_downloader().await;
    let mut events = downloader.subscribe();

    let id = downloader.submit(VIDEO_URL, None).await.unwrap();
    wait_for_terminal(&downloader, id).await;

    let mut names = Vec::new();
    while let Ok(event) = events.try_recv() {
        names.push(event.name());
    }
    assert_eq!(names.first(), Some(&"queued"));
    assert_eq!(names.last(), Some(&"completed"));
    assert!(names.contains(&"progress"));
}

#[tokio::test]
async fn test_finished_task_leaves_active_map() {
    let (downloader, _temp_dir) = create_test_downloader().await;

    let id = downloader.submit(VIDEO_URL, None).await.unwrap();
    wait_for_terminal(&downloader, id).await;

    tokio::time::timeout(Duration::from_secs(2), async {
        while downloader.active_job_count().await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_list_returns_jobs_oldest_first() {
    let (downloader, _temp_dir) = create_test_downloader_with(Arc::new(HangingBackend), |_| {}).await;

    let first = downloader.submit(VIDEO_URL, None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = downloader
        .submit("https://youtu.be/9bZkp7q19f0", None)
        .await
        .unwrap();

    let ids: Vec<JobId> = downloader
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![first, second]);
}
