use super::*;

#[tokio::test]
async fn test_cancel_running_job() {
    let (downloader, _temp_dir) = create_test_downloader_with(Arc::new(HangingBackend), |_| {}).await;
    let id = downloader.submit(VIDEO_URL, None).await.unwrap();
    wait_for_status(&downloader, id, JobStatus::FetchingInfo).await;

    downloader.cancel(id).await.unwrap();

    let status = downloader.get_status(id).await.unwrap();
    assert_eq!(status.status, JobStatus::Error);
    assert_eq!(status.error.as_deref(), Some("cancelled"));
    assert_eq!(status.progress, 10);

    tokio::time::timeout(Duration::from_secs(2), async {
        while downloader.active_job_count().await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("driving task did not stop after cancel");
}

#[tokio::test]
async fn test_cancel_terminal_job_is_invalid_state() {
    let (downloader, _temp_dir) = create_test_downloader().await;
    let id = downloader.submit(VIDEO_URL, None).await.unwrap();
    wait_for_terminal(&downloader, id).await;

    let err = downloader.cancel(id).await.unwrap_err();

    assert!(matches!(
        err,
        Error::InvalidState {
            current: JobStatus::Completed,
            ..
        }
    ));
    assert_eq!(
        downloader.get_status(id).await.unwrap().status,
        JobStatus::Completed
    );
}

#[tokio::test]
async fn test_cancel_unknown_job_is_not_found() {
    let (downloader, _temp_dir) = create_test_downloader().await;

    let err = downloader.cancel(JobId::new()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn test_cancel_emits_failed_event() {
    let (downloader, _temp_dir) = create_test_downloader_with(Arc::new(HangingBackend), |_| {}).await;
    let id = downloader.submit(VIDEO_URL, None).await.unwrap();
    wait_for_status(&downloader, id, JobStatus::FetchingInfo).await;
    let mut events = downloader.subscribe();

    downloader.cancel(id).await.unwrap();

    let event = events.recv().await.unwrap();
    assert!(matches!(event, Event::Failed { id: event_id, ref error } if event_id == id && error == "cancelled"));
}

#[tokio::test]
async fn test_reclaim_removes_record_and_file() {
    let (downloader, _temp_dir) =
        create_test_downloader_with(mock(MockOutcome::File { size_bytes: 32 }), |_| {}).await;
    let id = downloader.submit(VIDEO_URL, None).await.unwrap();
    wait_for_terminal(&downloader, id).await;

    let job = downloader.store.get(id).await.unwrap().unwrap();
    let path = job.result_location.unwrap().local_path().unwrap().clone();
    assert!(path.exists());

    assert!(downloader.reclaim(id).await.unwrap());

    assert!(!path.exists());
    assert!(matches!(
        downloader.get_status(id).await.unwrap_err(),
        Error::NotFound { .. }
    ));
    // Removing twice is harmless
    assert!(!downloader.reclaim(id).await.unwrap());
}

#[tokio::test]
async fn test_reclaim_cancels_running_task() {
    let (downloader, _temp_dir) = create_test_downloader_with(Arc::new(HangingBackend), |_| {}).await;
    let id = downloader.submit(VIDEO_URL, None).await.unwrap();
    wait_for_status(&downloader, id, JobStatus::FetchingInfo).await;

    assert!(downloader.reclaim(id).await.unwrap());

    tokio::time::timeout(Duration::from_secs(2), async {
        while downloader.active_job_count().await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("driving task survived reclaim");
    assert!(downloader.store.get(id).await.unwrap().is_none());
}
