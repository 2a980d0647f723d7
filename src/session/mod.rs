//! Session context tying the components together
//!
//! A [`MediaSession`] owns the current URL and metadata, the live queue and
//! the history ledger. Every failure that reaches a session method is turned
//! into a notification before the error is handed back to the caller.

use crate::api::{HttpBackend, MediaBackend, MediaKind, MediaMetadata};
use crate::database::DatabaseManager;
use crate::downloader::{DirectorySink, SaveSink};
use crate::history::{HistoryEntry, HistoryLedger};
use crate::metadata::{LoadedMetadata, MetadataClient, MetadataState};
use crate::notify::{Notification, NotificationChannel};
use crate::queue::{
    AcquisitionId, AcquisitionRecord, AcquisitionRequest, AcquisitionStatus, LifecycleManager,
    QueueEvent,
};
use crate::utils::config::AppSettings;
use crate::utils::error::{MediaSuiteError, Result};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

const EMPTY_URL_MESSAGE: &str = "Please enter a valid URL";
const INVALID_URL_MESSAGE: &str = "Invalid YouTube URL";
const METADATA_LOADED_MESSAGE: &str = "Video information loaded successfully!";
const DOWNLOAD_STARTED_MESSAGE: &str = "Download started!";
const UPDATING_MESSAGE: &str = "Updating yt-dlp...";
const UPDATE_FAILED_MESSAGE: &str = "Update failed";
const HISTORY_CLEARED_MESSAGE: &str = "History cleared";

pub struct MediaSession {
    settings: AppSettings,
    state: Mutex<MetadataState>,
    client: MetadataClient,
    manager: LifecycleManager,
    history: Arc<HistoryLedger>,
    notifier: NotificationChannel,
    backend: Arc<dyn MediaBackend>,
}

impl MediaSession {
    pub fn new(
        settings: AppSettings,
        backend: Arc<dyn MediaBackend>,
        sink: Arc<dyn SaveSink>,
        history: Arc<HistoryLedger>,
    ) -> Self {
        let notifier = NotificationChannel::new(settings.notification_ttl());
        let manager = LifecycleManager::new(
            Arc::clone(&backend),
            sink,
            Arc::clone(&history),
            notifier.clone(),
        );

        Self {
            state: Mutex::new(MetadataState::new(&settings)),
            client: MetadataClient::new(Arc::clone(&backend)),
            settings,
            manager,
            history,
            notifier,
            backend,
        }
    }

    /// Session over the HTTP backend, saving into the configured download
    /// directory. An unusable history database degrades to in-memory history.
    pub async fn connect(settings: AppSettings) -> Result<Self> {
        let backend = Arc::new(HttpBackend::new(settings.api_base())?);
        let sink = Arc::new(DirectorySink::new(settings.download_location.clone()));
        let history = Arc::new(open_history(&settings).await);

        info!(
            "Session ready: backend {}, saving to {}",
            backend.base_url(),
            settings.download_location.display()
        );
        Ok(Self::new(settings, backend, sink, history))
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub async fn url(&self) -> String {
        self.state.lock().await.url().to_string()
    }

    pub async fn set_url(&self, url: impl Into<String>) {
        self.state.lock().await.set_url(url);
    }

    pub async fn download_kind(&self) -> MediaKind {
        self.state.lock().await.download_kind()
    }

    pub async fn set_download_kind(&self, kind: MediaKind) {
        self.state.lock().await.set_download_kind(kind);
    }

    pub async fn available_qualities(&self) -> Vec<String> {
        self.state.lock().await.available_qualities().to_vec()
    }

    pub async fn selected_quality(&self) -> String {
        self.state.lock().await.selected_quality().to_string()
    }

    pub async fn select_quality(&self, quality: &str) -> Result<()> {
        let result = self.state.lock().await.select_quality(quality);
        self.report(result)
    }

    pub async fn metadata(&self) -> Option<MediaMetadata> {
        self.state.lock().await.metadata().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.client.is_loading()
    }

    /// Fetch metadata for the current URL.
    ///
    /// On failure the previously loaded metadata is left as it was. If the
    /// URL changes while the request is in flight the response is returned
    /// but not installed.
    pub async fn fetch_metadata(&self) -> Result<MediaMetadata> {
        let url = self.url().await;
        if url.trim().is_empty() {
            self.notifier.error(EMPTY_URL_MESSAGE);
            return Err(MediaSuiteError::InvalidUrl(url));
        }

        let (resource, metadata) = match self.client.fetch(&url).await {
            Ok(fetched) => fetched,
            Err(e) => return self.report(Err(e)),
        };

        let applied = self.state.lock().await.apply(
            &url,
            LoadedMetadata {
                resource,
                metadata: metadata.clone(),
            },
        );

        if applied {
            self.notifier.success(METADATA_LOADED_MESSAGE);
        } else {
            debug!("URL changed while fetching {}, discarding response", url);
        }
        Ok(metadata)
    }

    /// Start an acquisition for the current URL, kind and quality
    pub async fn start_download(&self) -> Result<AcquisitionId> {
        let request = {
            let state = self.state.lock().await;
            if state.url().trim().is_empty() {
                self.notifier.error(EMPTY_URL_MESSAGE);
                return Err(MediaSuiteError::InvalidUrl(String::new()));
            }

            let Some(loaded) = state.loaded() else {
                return self.report(Err(MediaSuiteError::MetadataNotLoaded));
            };

            AcquisitionRequest {
                resource: loaded.resource.clone(),
                source_url: state.url().to_string(),
                title: loaded.metadata.title.clone(),
                kind: state.download_kind(),
                quality: state.selected_quality().to_string(),
            }
        };

        let id = self.manager.start(request).await;
        self.notifier.success(DOWNLOAD_STARTED_MESSAGE);
        Ok(id)
    }

    pub async fn toggle_pause(&self, id: AcquisitionId) -> Result<AcquisitionStatus> {
        let status = self.report(self.manager.toggle_pause(id).await)?;
        match status {
            AcquisitionStatus::Paused => self.notifier.info("Download paused"),
            _ => self.notifier.info("Download resumed"),
        };
        Ok(status)
    }

    pub async fn cancel(&self, id: AcquisitionId) -> Result<()> {
        self.report(self.manager.cancel(id).await)?;
        self.notifier.info("Download cancelled");
        Ok(())
    }

    /// Re-submit a failed acquisition; the failed record stays in the queue
    pub async fn retry(&self, id: AcquisitionId) -> Result<AcquisitionId> {
        let new_id = self.report(self.manager.retry(id).await)?;
        self.notifier.success(DOWNLOAD_STARTED_MESSAGE);
        Ok(new_id)
    }

    pub async fn records(&self) -> Vec<AcquisitionRecord> {
        self.manager.records().await
    }

    pub async fn record(&self, id: AcquisitionId) -> Option<AcquisitionRecord> {
        self.manager.record(id).await
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.history.list().await
    }

    /// Empty the history. A store that refuses the clear is reported as an
    /// error notification, not "History cleared".
    pub async fn clear_history(&self) -> Result<()> {
        self.report(self.history.clear().await)?;
        self.notifier.info(HISTORY_CLEARED_MESSAGE);
        Ok(())
    }

    /// Ask the backend to update its extraction tool
    pub async fn update_tool(&self) -> Result<String> {
        self.notifier.info(UPDATING_MESSAGE);

        let response = self.report(self.backend.update_tool().await)?;
        if response.success {
            let message = response.message.unwrap_or_default();
            self.notifier.success(message.clone());
            Ok(message)
        } else {
            let error = response
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| UPDATE_FAILED_MESSAGE.to_string());
            self.report(Err(MediaSuiteError::UpdateFailed(error)))
        }
    }

    pub fn notification(&self) -> Option<Notification> {
        self.notifier.current()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.manager.subscribe()
    }

    /// Surface an error as a notification, then hand it back
    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.notifier.error(notification_text(e));
        }
        result
    }
}

fn notification_text(error: &MediaSuiteError) -> String {
    match error {
        MediaSuiteError::InvalidUrl(_) => INVALID_URL_MESSAGE.to_string(),
        other => other.to_string(),
    }
}

async fn open_history(settings: &AppSettings) -> HistoryLedger {
    if !settings.persist_history {
        return HistoryLedger::in_memory();
    }

    let path = &settings.history_db_path;
    if let Some(parent) = path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            warn!("Cannot create {}: {}; history kept in memory", parent.display(), e);
            return HistoryLedger::in_memory();
        }
    }

    let opened = match DatabaseManager::open(path).await {
        Ok(store) => HistoryLedger::open(store).await,
        Err(e) => Err(e),
    };

    opened.unwrap_or_else(|e| {
        warn!("History database unavailable ({}); history kept in memory", e);
        HistoryLedger::in_memory()
    })
}
