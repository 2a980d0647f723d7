//! End-to-end behaviour of a session over a scripted backend

mod common;

use common::*;
use mediasuite::api::UpdateResponse;
use mediasuite::{AcquisitionStatus, MediaKind, MediaSuiteError, Severity};

#[tokio::test]
async fn test_fetch_metadata_loads_and_resets_quality() {
    let h = harness();
    h.backend.push_info(Ok(sample_metadata("Clip")));

    h.session.set_url(VIDEO_URL).await;
    h.session.set_download_kind(MediaKind::Audio).await;
    let metadata = h.session.fetch_metadata().await.unwrap();

    assert_eq!(metadata.title, "Clip");
    assert_eq!(h.session.metadata().await, Some(metadata));
    // Reset is video-centric whatever kind is selected
    assert_eq!(h.session.selected_quality().await, "1080p");
    assert!(!h.session.is_loading());

    let note = h.session.notification().unwrap();
    assert_eq!(note.message, "Video information loaded successfully!");
    assert_eq!(note.severity, Severity::Success);
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_metadata() {
    let h = loaded_harness(VIDEO_URL).await;
    let before = h.session.metadata().await;

    h.backend.push_info(Err("Video unavailable".to_string()));
    let result = h.session.fetch_metadata().await;

    assert!(matches!(result, Err(MediaSuiteError::MetadataFetchFailed(ref m)) if m == "Video unavailable"));
    assert_eq!(h.session.metadata().await, before);
    assert!(!h.session.is_loading());

    let note = h.session.notification().unwrap();
    assert_eq!(note.message, "Video unavailable");
    assert_eq!(note.severity, Severity::Error);
}

#[tokio::test]
async fn test_invalid_url_never_reaches_backend() {
    let h = harness();
    h.session.set_url("https://vimeo.com/12345").await;

    let result = h.session.fetch_metadata().await;

    assert!(matches!(result, Err(MediaSuiteError::InvalidUrl(_))));
    assert_eq!(h.backend.info_calls(), 0);
    assert_eq!(h.session.notification().unwrap().message, "Invalid YouTube URL");
}

#[tokio::test]
async fn test_empty_url_is_rejected() {
    let h = harness();
    h.session.set_url("   ").await;

    assert!(h.session.fetch_metadata().await.is_err());
    assert_eq!(h.backend.info_calls(), 0);
    assert_eq!(h.session.notification().unwrap().message, "Please enter a valid URL");

    assert!(h.session.start_download().await.is_err());
    assert!(h.session.records().await.is_empty());
}

#[tokio::test]
async fn test_start_without_metadata_creates_nothing() {
    let h = harness();
    h.session.set_url(VIDEO_URL).await;

    let result = h.session.start_download().await;

    assert!(matches!(result, Err(MediaSuiteError::MetadataNotLoaded)));
    assert!(h.session.records().await.is_empty());
    assert_eq!(h.backend.download_calls(), 0);
    assert_eq!(
        h.session.notification().unwrap().message,
        "Please scan the video first by clicking \"Get Info\""
    );
}

#[tokio::test]
async fn test_url_change_requires_new_fetch() {
    let h = loaded_harness(VIDEO_URL).await;
    h.session.set_url(OTHER_URL).await;

    assert!(h.session.metadata().await.is_none());
    assert!(matches!(
        h.session.start_download().await,
        Err(MediaSuiteError::MetadataNotLoaded)
    ));
}

#[tokio::test]
async fn test_completed_download_enters_history_once() {
    let h = loaded_harness(VIDEO_URL).await;
    let id = h.session.start_download().await.unwrap();
    assert_eq!(h.session.notification().unwrap().message, "Download started!");

    h.backend.wait_for_downloads(1).await;
    let request = &h.backend.pending_requests()[0];
    assert_eq!(request.url, VIDEO_URL);
    assert_eq!(request.kind, MediaKind::Video);
    assert_eq!(request.quality, "1080p");

    h.backend.release(0, Ok(payload(Some("Never Gonna.mp4"), b"video-bytes")));
    let record = wait_for_record(&h.session, id, |r| r.status == AcquisitionStatus::Completed).await;

    assert_eq!(record.progress_percent, 100.0);
    assert_eq!(record.eta.to_string(), "Complete");
    assert_eq!(record.filename.as_deref(), Some("Never Gonna.mp4"));
    assert_eq!(
        h.sink.saved(),
        vec![("Never Gonna.mp4".to_string(), b"video-bytes".to_vec())]
    );

    let history = h.session.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, id);
    assert_eq!(history[0].progress_percent, 100.0);
    assert_eq!(history[0].title, "Loaded");
    assert_eq!(
        h.session.notification().unwrap().message,
        "Download saved to your local system."
    );
}

#[tokio::test]
async fn test_audio_download_without_header_gets_synthesized_name() {
    let h = loaded_harness(VIDEO_URL).await;
    h.session.set_download_kind(MediaKind::Audio).await;
    h.session.select_quality("128k").await.unwrap();

    let id = h.session.start_download().await.unwrap();
    h.backend.wait_for_downloads(1).await;
    assert_eq!(h.backend.pending_requests()[0].quality, "128k");

    h.backend.release(0, Ok(payload(None, b"audio")));
    let record = wait_for_record(&h.session, id, |r| r.status == AcquisitionStatus::Completed).await;

    assert_eq!(record.format_label, "mp3");
    assert_eq!(h.sink.saved_names(), vec!["download.mp3".to_string()]);
}

#[tokio::test]
async fn test_unknown_quality_is_rejected() {
    let h = loaded_harness(VIDEO_URL).await;

    let result = h.session.select_quality("4320p").await;

    assert!(matches!(result, Err(MediaSuiteError::UnknownQuality(_))));
    assert_eq!(h.session.selected_quality().await, "1080p");
    assert_eq!(h.session.notification().unwrap().severity, Severity::Error);
}

#[tokio::test]
async fn test_failed_transfer_stays_visible() {
    let h = loaded_harness(VIDEO_URL).await;
    let id = h.session.start_download().await.unwrap();

    h.backend.wait_for_downloads(1).await;
    h.backend.release(0, Err("HTTP 500: extraction failed".to_string()));
    let record = wait_for_record(&h.session, id, |r| r.status.is_terminal()).await;

    assert_eq!(
        record.status,
        AcquisitionStatus::Failed("HTTP 500: extraction failed".to_string())
    );
    assert_eq!(record.eta.to_string(), "Failed");
    assert_eq!(h.session.records().await.len(), 1);
    assert!(h.session.history().await.is_empty());
    assert_eq!(
        h.session.notification().unwrap().message,
        "HTTP 500: extraction failed"
    );
}

#[tokio::test]
async fn test_save_failure_fails_acquisition() {
    let h = loaded_harness(VIDEO_URL).await;
    h.sink.fail_saves(true);
    let id = h.session.start_download().await.unwrap();

    h.backend.wait_for_downloads(1).await;
    h.backend.release(0, Ok(payload(Some("clip.mp4"), b"bytes")));
    let record = wait_for_record(&h.session, id, |r| r.status.is_terminal()).await;

    assert!(matches!(record.status, AcquisitionStatus::Failed(_)));
    assert!(h.session.history().await.is_empty());
}

#[tokio::test]
async fn test_cancelled_download_never_reaches_history() {
    let h = loaded_harness(VIDEO_URL).await;
    let id = h.session.start_download().await.unwrap();
    h.backend.wait_for_downloads(1).await;

    h.session.cancel(id).await.unwrap();
    assert!(h.session.records().await.is_empty());
    assert_eq!(h.session.notification().unwrap().message, "Download cancelled");

    // The transfer task is gone, so releasing its gate reaches nobody
    h.backend.release(0, Ok(payload(Some("late.mp4"), b"late")));
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    assert!(h.session.records().await.is_empty());
    assert!(h.session.history().await.is_empty());
    assert!(h.sink.saved().is_empty());

    // Second cancel is a lookup miss
    assert!(matches!(
        h.session.cancel(id).await,
        Err(MediaSuiteError::AcquisitionNotFound(_))
    ));
}

#[tokio::test]
async fn test_pause_is_advisory() {
    let h = loaded_harness(VIDEO_URL).await;
    let id = h.session.start_download().await.unwrap();

    assert_eq!(h.session.toggle_pause(id).await.unwrap(), AcquisitionStatus::Paused);
    assert_eq!(h.session.notification().unwrap().message, "Download paused");
    assert_eq!(
        h.session.toggle_pause(id).await.unwrap(),
        AcquisitionStatus::Downloading
    );
    assert_eq!(h.session.notification().unwrap().message, "Download resumed");
    h.session.toggle_pause(id).await.unwrap();

    // The transfer still completes while paused
    h.backend.wait_for_downloads(1).await;
    h.backend.release(0, Ok(payload(Some("clip.mp4"), b"bytes")));
    wait_for_record(&h.session, id, |r| r.status == AcquisitionStatus::Completed).await;
    assert_eq!(h.session.history().await.len(), 1);
}

#[tokio::test]
async fn test_retry_resubmits_failed_acquisition() {
    let h = loaded_harness(VIDEO_URL).await;
    let failed = h.session.start_download().await.unwrap();
    h.backend.wait_for_downloads(1).await;
    h.backend.release(0, Err("network down".to_string()));
    wait_for_record(&h.session, failed, |r| r.status.is_terminal()).await;

    let retried = h.session.retry(failed).await.unwrap();
    assert_ne!(retried, failed);

    h.backend.wait_for_downloads(1).await;
    h.backend.release(0, Ok(payload(Some("clip.mp4"), b"bytes")));
    wait_for_record(&h.session, retried, |r| r.status == AcquisitionStatus::Completed).await;

    let records = h.session.records().await;
    assert_eq!(records.len(), 2);
    assert!(matches!(
        h.session.record(failed).await.unwrap().status,
        AcquisitionStatus::Failed(_)
    ));
    assert_eq!(h.backend.download_calls(), 2);
}

#[tokio::test]
async fn test_clear_history() {
    let h = loaded_harness(VIDEO_URL).await;
    let id = h.session.start_download().await.unwrap();
    h.backend.wait_for_downloads(1).await;
    h.backend.release(0, Ok(payload(Some("clip.mp4"), b"bytes")));
    wait_for_record(&h.session, id, |r| r.status == AcquisitionStatus::Completed).await;
    assert_eq!(h.session.history().await.len(), 1);

    h.session.clear_history().await.unwrap();

    assert!(h.session.history().await.is_empty());
    let note = h.session.notification().unwrap();
    assert_eq!(note.message, "History cleared");
    assert_eq!(note.severity, Severity::Info);
    // The live queue is independent of history
    assert_eq!(h.session.records().await.len(), 1);
}

#[tokio::test]
async fn test_update_tool_reports_outcome() {
    let h = harness();
    let mut notes = h.session.notifications();

    h.backend.set_update(Ok(UpdateResponse {
        success: true,
        message: Some("yt-dlp is up to date".to_string()),
        error: None,
    }));
    let message = h.session.update_tool().await.unwrap();
    assert_eq!(message, "yt-dlp is up to date");
    assert_eq!(notes.recv().await.unwrap().message, "Updating yt-dlp...");
    assert_eq!(notes.recv().await.unwrap().message, "yt-dlp is up to date");

    h.backend.set_update(Ok(UpdateResponse {
        success: false,
        message: None,
        error: None,
    }));
    let result = h.session.update_tool().await;
    assert!(matches!(result, Err(MediaSuiteError::UpdateFailed(ref m)) if m == "Update failed"));
    assert_eq!(h.session.notification().unwrap().message, "Update failed");

    let result = h.session.update_tool().await;
    assert!(matches!(result, Err(MediaSuiteError::UpdateFailed(_))));
    assert_eq!(
        h.session.notification().unwrap().message,
        "Failed to update yt-dlp"
    );
}
