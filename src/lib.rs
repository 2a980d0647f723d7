//! MediaSuite library
//!
//! Resolves media URLs, fetches their metadata from a companion backend and
//! drives concurrent downloads through a small acquisition state machine,
//! keeping a durable history of what completed.

pub mod api;
pub mod database;
pub mod downloader;
pub mod history;
pub mod metadata;
pub mod notify;
pub mod queue;
pub mod resolver;
pub mod session;
pub mod utils;

// Re-export main types for easier use
pub use api::{HttpBackend, MediaBackend, MediaKind, MediaMetadata};
pub use downloader::{DirectorySink, SaveSink, TransferProgress};
pub use history::{HistoryEntry, HistoryLedger};
pub use notify::{Notification, NotificationChannel, Severity};
pub use queue::{AcquisitionId, AcquisitionRecord, AcquisitionStatus, LifecycleManager, QueueEvent};
pub use resolver::{resolve, ResourceKind, ResourceReference};
pub use session::MediaSession;
pub use utils::{AppSettings, MediaSuiteError};
