//! Transient user-facing notifications
//!
//! At most one notification is active. A new one replaces the current one and
//! gets a fresh expiry window; the expiry of a replaced notification only ever
//! clears its own id, so it cannot clip its successor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
struct ActiveNotification {
    notification: Notification,
    expires_at: Instant,
}

/// Single-slot notification surface shared by every orchestrator component
#[derive(Clone)]
pub struct NotificationChannel {
    active: Arc<Mutex<Option<ActiveNotification>>>,
    next_id: Arc<AtomicU64>,
    ttl: Duration,
    sender: broadcast::Sender<Notification>,
}

impl NotificationChannel {
    pub fn new(ttl: Duration) -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            active: Arc::new(Mutex::new(None)),
            next_id: Arc::new(AtomicU64::new(0)),
            ttl,
            sender,
        }
    }

    /// Replace the active notification and restart the expiry window
    pub fn emit(&self, message: impl Into<String>, severity: Severity) -> Notification {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            message: message.into(),
            severity,
            created_at: Utc::now(),
        };

        match severity {
            Severity::Error => warn!("[notify] {}", notification.message),
            _ => info!("[notify] {}", notification.message),
        }

        *self.lock() = Some(ActiveNotification {
            notification: notification.clone(),
            expires_at: Instant::now() + self.ttl,
        });

        // No subscribers is fine
        let _ = self.sender.send(notification.clone());
        self.schedule_expiry(notification.id);

        notification
    }

    pub fn info(&self, message: impl Into<String>) -> Notification {
        self.emit(message, Severity::Info)
    }

    pub fn success(&self, message: impl Into<String>) -> Notification {
        self.emit(message, Severity::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> Notification {
        self.emit(message, Severity::Error)
    }

    /// The active notification, if any and not yet expired
    pub fn current(&self) -> Option<Notification> {
        self.lock()
            .as_ref()
            .filter(|active| Instant::now() < active.expires_at)
            .map(|active| active.notification.clone())
    }

    pub fn dismiss(&self) {
        *self.lock() = None;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveNotification>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn schedule_expiry(&self, id: u64) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime; notification {} expires lazily", id);
            return;
        };

        let active = Arc::clone(&self.active);
        let ttl = self.ttl;
        handle.spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut guard = active.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if guard.as_ref().map(|a| a.notification.id) == Some(id) {
                *guard = None;
            }
        });
    }
}
