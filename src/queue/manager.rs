//! Acquisition lifecycle manager
//!
//! Owns the ordered acquisition queue (newest first). Every record change is
//! an atomic replace-by-id under the queue lock, so concurrent transfers
//! resolving in any order never lose each other's updates.

use crate::api::{MediaBackend, MediaKind, TransferPayload, TransferRequest};
use crate::downloader::{derive_filename, SaveSink, TransferProgress};
use crate::history::{HistoryEntry, HistoryLedger};
use crate::notify::NotificationChannel;
use crate::queue::events::QueueEvent;
use crate::queue::record::{
    AcquisitionId, AcquisitionRecord, AcquisitionRequest, AcquisitionStatus, IdGenerator,
    Transition,
};
use crate::utils::error::{MediaSuiteError, Result};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const SAVED_MESSAGE: &str = "Download saved to your local system.";
const FAILED_FALLBACK: &str = "Download failed";

#[derive(Clone)]
pub struct LifecycleManager {
    records: Arc<Mutex<Vec<AcquisitionRecord>>>,
    active_transfers: Arc<Mutex<HashMap<AcquisitionId, JoinHandle<()>>>>,
    /// Ids cancelled by the user; late transfer resolutions for these are dropped
    discarded: Arc<Mutex<HashSet<AcquisitionId>>>,
    backend: Arc<dyn MediaBackend>,
    sink: Arc<dyn SaveSink>,
    history: Arc<HistoryLedger>,
    notifier: NotificationChannel,
    events: broadcast::Sender<QueueEvent>,
    ids: Arc<IdGenerator>,
}

impl LifecycleManager {
    pub fn new(
        backend: Arc<dyn MediaBackend>,
        sink: Arc<dyn SaveSink>,
        history: Arc<HistoryLedger>,
        notifier: NotificationChannel,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            active_transfers: Arc::new(Mutex::new(HashMap::new())),
            discarded: Arc::new(Mutex::new(HashSet::new())),
            backend,
            sink,
            history,
            notifier,
            events,
            ids: Arc::new(IdGenerator::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    /// Create an acquisition for `request` and issue its transfer.
    ///
    /// Returns as soon as the transfer is in flight; completion is observed
    /// through [`records`](Self::records) or [`subscribe`](Self::subscribe).
    pub async fn start(&self, request: AcquisitionRequest) -> AcquisitionId {
        let id = self.ids.next_id();
        let transfer = request.transfer();

        let queued = AcquisitionRecord::new(id, &request);
        let downloading = match queued.transition(Transition::Start) {
            Ok(record) => record,
            Err(e) => {
                // A fresh record is always queued
                error!("Acquisition {} could not start: {}", id, e);
                queued
            }
        };

        {
            let mut records = self.records.lock().await;
            records.insert(0, downloading.clone());
        }
        info!("Added acquisition {} ({}) to queue", id, downloading.resource);

        self.publish(QueueEvent::Added {
            record: downloading.clone(),
            timestamp: Utc::now(),
        });
        self.publish(QueueEvent::StatusChanged {
            id,
            status: downloading.status.clone(),
            timestamp: Utc::now(),
        });

        self.spawn_transfer(id, transfer).await;
        id
    }

    /// Flip between downloading and paused. Advisory only: the transfer
    /// keeps running and may still complete while paused.
    pub async fn toggle_pause(&self, id: AcquisitionId) -> Result<AcquisitionStatus> {
        let record = self
            .replace_by_id(id, |r| r.transition(Transition::TogglePause))
            .await?;

        info!("Acquisition {} is now {}", id, record.status);
        self.publish(QueueEvent::StatusChanged {
            id,
            status: record.status.clone(),
            timestamp: Utc::now(),
        });
        Ok(record.status)
    }

    /// Remove an acquisition from the queue and discard its transfer
    pub async fn cancel(&self, id: AcquisitionId) -> Result<AcquisitionRecord> {
        let removed = {
            let mut records = self.records.lock().await;
            let position = records
                .iter()
                .position(|r| r.id == id)
                .ok_or(MediaSuiteError::AcquisitionNotFound(id))?;
            records[position].status.apply(&Transition::Cancel)?;
            records.remove(position)
        };

        self.discarded.lock().await.insert(id);

        if let Some(handle) = self.active_transfers.lock().await.remove(&id) {
            handle.abort();
            debug!("Aborted transfer for acquisition {}", id);
        }

        info!("Cancelled acquisition {}", id);
        self.publish(QueueEvent::Removed {
            id,
            timestamp: Utc::now(),
        });
        Ok(removed)
    }

    /// Re-submit a failed acquisition as a new one
    pub async fn retry(&self, id: AcquisitionId) -> Result<AcquisitionId> {
        let record = self
            .record(id)
            .await
            .ok_or(MediaSuiteError::AcquisitionNotFound(id))?;

        if !matches!(record.status, AcquisitionStatus::Failed(_)) {
            return Err(MediaSuiteError::InvalidTransition {
                from: record.status.label().to_string(),
                action: "retry",
            });
        }

        info!("Retrying failed acquisition {}", id);
        Ok(self.start(record.request()).await)
    }

    /// Snapshot of the queue, newest first
    pub async fn records(&self) -> Vec<AcquisitionRecord> {
        self.records.lock().await.clone()
    }

    pub async fn record(&self, id: AcquisitionId) -> Option<AcquisitionRecord> {
        self.records
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Number of transfers still outstanding
    pub async fn in_flight(&self) -> usize {
        self.active_transfers.lock().await.len()
    }

    async fn spawn_transfer(&self, id: AcquisitionId, request: TransferRequest) {
        // Hold the map while spawning so the task cannot deregister before
        // it is registered
        let mut active = self.active_transfers.lock().await;
        let manager = self.clone();
        let handle = tokio::spawn(async move {
            manager.run_transfer(id, request).await;
        });
        active.insert(id, handle);
        debug!("Issued transfer for acquisition {}", id);
    }

    async fn run_transfer(&self, id: AcquisitionId, request: TransferRequest) {
        let (progress_tx, mut progress_rx) = mpsc::channel::<TransferProgress>(32);

        let transfer = self.backend.download(&request, progress_tx);
        let pump = async {
            while let Some(progress) = progress_rx.recv().await {
                self.apply_progress(id, &progress).await;
            }
        };

        let (outcome, ()) = tokio::join!(transfer, pump);

        match outcome {
            Ok(payload) => self.complete(id, request.kind, payload).await,
            Err(e) => self.fail(id, e.to_string()).await,
        }

        self.active_transfers.lock().await.remove(&id);
    }

    async fn apply_progress(&self, id: AcquisitionId, progress: &TransferProgress) {
        if let Ok(record) = self.replace_by_id(id, |r| Ok(r.with_progress(progress))).await {
            self.publish(QueueEvent::Progress {
                id,
                percent: record.progress_percent,
                rate: record.transfer_rate,
                eta: record.eta,
            });
        }
    }

    /// Save the payload and mark the acquisition completed. A missing or
    /// cancelled id is a no-op.
    ///
    /// The liveness check, the save and the transition to completed all
    /// happen under the queue lock, so a concurrent `cancel` either removes
    /// the record before anything is written or waits and finds it completed.
    pub(crate) async fn complete(&self, id: AcquisitionId, kind: MediaKind, payload: TransferPayload) {
        let filename = derive_filename(payload.content_disposition.as_deref(), kind);

        let outcome = {
            let mut records = self.records.lock().await;
            let Some(slot) = records.iter_mut().find(|r| r.id == id) else {
                debug!("Acquisition {} resolved after cancellation, ignoring", id);
                return;
            };

            let completed = match slot.completed(filename.clone()) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Acquisition {} could not complete: {}", id, e);
                    return;
                }
            };

            match self.save_blocking(payload.body, filename.clone()).await {
                Ok(()) => {
                    *slot = completed.clone();
                    match HistoryEntry::from_completed(&completed, Utc::now()) {
                        Ok(entry) => self.history.append(entry).await,
                        Err(e) => warn!("Acquisition {} not recorded in history: {}", id, e),
                    }
                    Ok(())
                }
                Err(e) => {
                    error!("Failed to save {} for acquisition {}: {}", filename, id, e);
                    let message = failure_message(e.to_string());
                    match slot.transition(Transition::Fail(message.clone())) {
                        Ok(failed) => *slot = failed,
                        Err(e) => warn!("Acquisition {} could not fail: {}", id, e),
                    }
                    Err(message)
                }
            }
        };

        match outcome {
            Ok(()) => {
                info!("Acquisition {} completed as {}", id, filename);
                self.publish(QueueEvent::Completed {
                    id,
                    filename,
                    timestamp: Utc::now(),
                });
                self.notifier.success(SAVED_MESSAGE);
            }
            Err(message) => {
                self.publish(QueueEvent::Failed {
                    id,
                    error: message.clone(),
                    timestamp: Utc::now(),
                });
                self.notifier.error(message);
            }
        }
    }

    /// Run the synchronous sink on the blocking pool
    async fn save_blocking(&self, body: Vec<u8>, filename: String) -> Result<()> {
        let sink = Arc::clone(&self.sink);
        tokio::task::spawn_blocking(move || sink.save(&body, &filename))
            .await
            .map_err(|e| MediaSuiteError::TransferFailed(format!("save task failed: {}", e)))?
    }

    /// Mark the acquisition failed. A missing or cancelled id is a no-op.
    pub(crate) async fn fail(&self, id: AcquisitionId, message: String) {
        if !self.is_live(id).await {
            debug!("Acquisition {} failed after cancellation, ignoring", id);
            return;
        }

        let message = failure_message(message);

        match self
            .replace_by_id(id, |r| r.transition(Transition::Fail(message.clone())))
            .await
        {
            Ok(_) => {
                error!("Acquisition {} failed: {}", id, message);
                self.publish(QueueEvent::Failed {
                    id,
                    error: message.clone(),
                    timestamp: Utc::now(),
                });
                self.notifier.error(message);
            }
            Err(MediaSuiteError::AcquisitionNotFound(_)) => {
                debug!("Acquisition {} vanished before failure", id);
            }
            Err(e) => warn!("Acquisition {} could not fail: {}", id, e),
        }
    }

    async fn is_live(&self, id: AcquisitionId) -> bool {
        if self.discarded.lock().await.contains(&id) {
            return false;
        }
        self.records.lock().await.iter().any(|r| r.id == id)
    }

    /// Replace the record with `id` by `f(record)` under the queue lock
    async fn replace_by_id<F>(&self, id: AcquisitionId, f: F) -> Result<AcquisitionRecord>
    where
        F: FnOnce(&AcquisitionRecord) -> Result<AcquisitionRecord>,
    {
        let mut records = self.records.lock().await;
        let slot = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(MediaSuiteError::AcquisitionNotFound(id))?;
        let updated = f(slot)?;
        *slot = updated.clone();
        Ok(updated)
    }

    fn publish(&self, event: QueueEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

fn failure_message(message: String) -> String {
    if message.trim().is_empty() {
        FAILED_FALLBACK.to_string()
    } else {
        message
    }
}
