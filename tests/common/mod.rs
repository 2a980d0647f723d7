//! Shared fixtures: an in-process backend driven by the test and a memory sink

#![allow(dead_code)]

use async_trait::async_trait;
use mediasuite::api::{TransferPayload, TransferRequest, UpdateResponse};
use mediasuite::downloader::TransferProgress;
use mediasuite::utils::{MediaSuiteError, Result};
use mediasuite::{
    AcquisitionId, AcquisitionRecord, AppSettings, HistoryLedger, MediaBackend, MediaMetadata,
    MediaSession, SaveSink,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
pub const OTHER_URL: &str = "https://youtu.be/9bZkp7q19f0";

pub fn sample_metadata(title: &str) -> MediaMetadata {
    MediaMetadata {
        title: title.to_string(),
        uploader_name: "Uploader".to_string(),
        duration_label: "3:32".to_string(),
        view_count: Some(1_000),
        description: Some("desc".to_string()),
        thumbnail_url: None,
        available_video_qualities: vec!["1080p".to_string(), "720p".to_string()],
        available_audio_qualities: vec!["192k".to_string(), "128k".to_string()],
    }
}

pub fn payload(filename: Option<&str>, body: &[u8]) -> TransferPayload {
    TransferPayload {
        body: body.to_vec(),
        content_disposition: filename.map(|f| format!("attachment; filename=\"{}\"", f)),
    }
}

type Gate = oneshot::Sender<std::result::Result<TransferPayload, String>>;

/// Backend whose responses are scripted by the test. Downloads block until
/// released with [`ScriptedBackend::release`].
#[derive(Default)]
pub struct ScriptedBackend {
    info_script: Mutex<VecDeque<std::result::Result<MediaMetadata, String>>>,
    info_calls: AtomicUsize,
    downloads: Mutex<Vec<(TransferRequest, Gate)>>,
    download_calls: AtomicUsize,
    update_script: Mutex<Option<std::result::Result<UpdateResponse, String>>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_info(&self, outcome: std::result::Result<MediaMetadata, String>) {
        self.info_script.lock().unwrap().push_back(outcome);
    }

    pub fn set_update(&self, outcome: std::result::Result<UpdateResponse, String>) {
        *self.update_script.lock().unwrap() = Some(outcome);
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub fn pending_downloads(&self) -> usize {
        self.downloads.lock().unwrap().len()
    }

    /// Requests of the downloads still waiting, oldest first
    pub fn pending_requests(&self) -> Vec<TransferRequest> {
        self.downloads
            .lock()
            .unwrap()
            .iter()
            .map(|(request, _)| request.clone())
            .collect()
    }

    /// Resolve the pending download at `index` (oldest first)
    pub fn release(&self, index: usize, outcome: std::result::Result<TransferPayload, String>) {
        let (_, gate) = self.downloads.lock().unwrap().remove(index);
        let _ = gate.send(outcome);
    }

    pub async fn wait_for_downloads(&self, count: usize) {
        wait_for(|| self.pending_downloads() >= count).await;
    }
}

#[async_trait]
impl MediaBackend for ScriptedBackend {
    fn id(&self) -> &'static str {
        "scripted"
    }

    async fn video_info(&self, _url: &str) -> Result<MediaMetadata> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.info_script.lock().unwrap().pop_front();
        match next {
            Some(Ok(metadata)) => Ok(metadata),
            Some(Err(message)) => Err(MediaSuiteError::MetadataFetchFailed(message)),
            None => Err(MediaSuiteError::MetadataFetchFailed(
                "no scripted response".to_string(),
            )),
        }
    }

    async fn download(
        &self,
        request: &TransferRequest,
        progress_tx: mpsc::Sender<TransferProgress>,
    ) -> Result<TransferPayload> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);

        let mut progress = TransferProgress::new(Some(100));
        progress.update(40, 1024.0);
        let _ = progress_tx.send(progress).await;

        let (tx, rx) = oneshot::channel();
        self.downloads.lock().unwrap().push((request.clone(), tx));

        match rx.await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(message)) => Err(MediaSuiteError::TransferFailed(message)),
            Err(_) => Err(MediaSuiteError::TransferFailed("gate dropped".to_string())),
        }
    }

    async fn update_tool(&self) -> Result<UpdateResponse> {
        match self.update_script.lock().unwrap().take() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(MediaSuiteError::UpdateFailed(message)),
            None => Err(MediaSuiteError::UpdateFailed("Failed to update yt-dlp".to_string())),
        }
    }
}

/// Save sink that keeps artifacts in memory
#[derive(Default)]
pub struct MemorySink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
    failing: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_saves(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn saved_names(&self) -> Vec<String> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().unwrap().clone()
    }
}

impl SaveSink for MemorySink {
    fn save(&self, blob: &[u8], filename: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MediaSuiteError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "disk is read-only",
            )));
        }
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), blob.to_vec()));
        Ok(())
    }
}

pub struct Harness {
    pub session: MediaSession,
    pub backend: Arc<ScriptedBackend>,
    pub sink: Arc<MemorySink>,
}

pub fn harness() -> Harness {
    let backend = ScriptedBackend::new();
    let sink = MemorySink::new();
    let settings = AppSettings {
        persist_history: false,
        ..AppSettings::default()
    };
    let session = MediaSession::new(
        settings,
        backend.clone(),
        sink.clone(),
        Arc::new(HistoryLedger::in_memory()),
    );
    Harness {
        session,
        backend,
        sink,
    }
}

/// Harness with metadata already loaded for `url`
pub async fn loaded_harness(url: &str) -> Harness {
    let h = harness();
    h.backend.push_info(Ok(sample_metadata("Loaded")));
    h.session.set_url(url).await;
    h.session.fetch_metadata().await.unwrap();
    h
}

pub async fn wait_for<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Wait until the record with `id` satisfies `predicate`
pub async fn wait_for_record<F>(session: &MediaSession, id: AcquisitionId, predicate: F) -> AcquisitionRecord
where
    F: Fn(&AcquisitionRecord) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(record) = session.record(id).await {
                if predicate(&record) {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("record did not reach expected state")
}
