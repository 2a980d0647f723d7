//! Append-only ledger of completed acquisitions
//!
//! Kept in memory and, when a [`DatabaseManager`] is attached, written through
//! to SQLite. A failing write is logged and never blocks the in-memory ledger;
//! a failing clear is reported to the caller, since the rows would come back
//! on the next load.

use crate::api::MediaKind;
use crate::database::DatabaseManager;
use crate::queue::{AcquisitionId, AcquisitionRecord, AcquisitionStatus};
use crate::resolver::ResourceReference;
use crate::utils::error::{MediaSuiteError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// A finished acquisition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: AcquisitionId,
    pub resource: ResourceReference,
    pub source_url: String,
    pub title: String,
    pub media_kind: MediaKind,
    pub quality: String,
    pub format_label: String,
    pub filename: String,
    pub progress_percent: f32,
    pub completed_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Snapshot a completed record. Any other status is rejected.
    pub fn from_completed(record: &AcquisitionRecord, completed_at: DateTime<Utc>) -> Result<Self> {
        if record.status != AcquisitionStatus::Completed {
            return Err(MediaSuiteError::InvalidTransition {
                from: record.status.label().to_string(),
                action: "record in history",
            });
        }

        Ok(Self {
            id: record.id,
            resource: record.resource.clone(),
            source_url: record.source_url.clone(),
            title: record.title.clone(),
            media_kind: record.media_kind,
            quality: record.quality.clone(),
            format_label: record.format_label.clone(),
            filename: record
                .filename
                .clone()
                .unwrap_or_else(|| format!("download.{}", record.format_label)),
            progress_percent: 100.0,
            completed_at,
        })
    }
}

#[derive(Default)]
struct LedgerState {
    /// Oldest first; listing reverses
    entries: Vec<HistoryEntry>,
    ids: HashSet<AcquisitionId>,
}

impl LedgerState {
    fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        let ids = entries.iter().map(|e| e.id).collect();
        Self { entries, ids }
    }
}

pub struct HistoryLedger {
    state: Mutex<LedgerState>,
    store: Option<DatabaseManager>,
}

impl HistoryLedger {
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            store: None,
        }
    }

    /// Ledger backed by `store`, preloaded with what it already holds
    pub async fn open(store: DatabaseManager) -> anyhow::Result<Self> {
        let mut entries = store.get_history().await?;
        entries.reverse();
        info!("Loaded {} history entries", entries.len());

        Ok(Self {
            state: Mutex::new(LedgerState::from_entries(entries)),
            store: Some(store),
        })
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    pub async fn append(&self, entry: HistoryEntry) {
        {
            let mut state = self.state.lock().await;
            if !state.ids.insert(entry.id) {
                debug!("History already holds {}", entry.id);
                return;
            }
            state.entries.push(entry.clone());
        }

        if let Some(store) = &self.store {
            if let Err(e) = store.save_history_entry(&entry).await {
                warn!("Failed to persist history entry {}: {}", entry.id, e);
            }
        }
    }

    /// Most recently completed first
    pub async fn list(&self) -> Vec<HistoryEntry> {
        let mut entries = self.state.lock().await.entries.clone();
        entries.reverse();
        entries
    }

    /// Drop every entry. Memory is emptied even when the store refuses,
    /// in which case the store error is returned.
    pub async fn clear(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.entries.clear();
            state.ids.clear();
        }

        if let Some(store) = &self.store {
            store.clear_history().await.map_err(|e| {
                error!("Failed to clear persisted history: {}", e);
                MediaSuiteError::HistoryStore(e.to_string())
            })?;
        }
        info!("History cleared");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
