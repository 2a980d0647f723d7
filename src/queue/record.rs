//! Acquisition records and their state machine

use crate::api::{MediaKind, TransferRequest};
use crate::downloader::TransferProgress;
use crate::resolver::ResourceReference;
use crate::utils::error::{MediaSuiteError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Process-unique acquisition id, derived from wall-clock milliseconds and
/// strictly increasing within a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AcquisitionId(u64);

impl AcquisitionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for AcquisitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out [`AcquisitionId`]s; never repeats one
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> AcquisitionId {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        AcquisitionId(now.max(previous + 1))
    }
}

/// Acquisition status
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AcquisitionStatus {
    #[default]
    Queued,
    Downloading,
    Paused,
    Completed,
    Failed(String),
    Cancelled,
}

/// Events that move an acquisition between statuses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The transfer request has been issued
    Start,
    /// User toggle between downloading and paused
    TogglePause,
    /// Payload received and handed to the save sink
    Succeed,
    Fail(String),
    Cancel,
}

impl Transition {
    fn action(&self) -> &'static str {
        match self {
            Transition::Start => "start",
            Transition::TogglePause => "pause or resume",
            Transition::Succeed => "complete",
            Transition::Fail(_) => "fail",
            Transition::Cancel => "cancel",
        }
    }
}

impl AcquisitionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AcquisitionStatus::Queued => "queued",
            AcquisitionStatus::Downloading => "downloading",
            AcquisitionStatus::Paused => "paused",
            AcquisitionStatus::Completed => "completed",
            AcquisitionStatus::Failed(_) => "failed",
            AcquisitionStatus::Cancelled => "cancelled",
        }
    }

    /// No further automatic transition happens from a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AcquisitionStatus::Completed | AcquisitionStatus::Failed(_) | AcquisitionStatus::Cancelled
        )
    }

    /// Compute the status after `transition`, rejecting anything the
    /// lifecycle does not allow (e.g. completed -> downloading)
    pub fn apply(&self, transition: &Transition) -> Result<AcquisitionStatus> {
        use AcquisitionStatus::*;

        let next = match (self, transition) {
            (Queued, Transition::Start) => Downloading,
            (Downloading, Transition::TogglePause) => Paused,
            (Paused, Transition::TogglePause) => Downloading,
            (Downloading | Paused, Transition::Succeed) => Completed,
            (Queued | Downloading | Paused, Transition::Fail(error)) => Failed(error.clone()),
            (status, Transition::Cancel) if *status != Cancelled => Cancelled,
            _ => {
                return Err(MediaSuiteError::InvalidTransition {
                    from: self.label().to_string(),
                    action: transition.action(),
                })
            }
        };
        Ok(next)
    }
}

impl fmt::Display for AcquisitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionStatus::Failed(error) => write!(f, "failed: {}", error),
            other => f.write_str(other.label()),
        }
    }
}

/// What the UI shows in the time-remaining slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EtaDisplay {
    #[default]
    Starting,
    Remaining(Duration),
    Unknown,
    Complete,
    Failed,
}

impl fmt::Display for EtaDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtaDisplay::Starting => f.write_str("Starting..."),
            EtaDisplay::Remaining(d) => {
                let secs = d.as_secs();
                write!(f, "{:02}:{:02}", secs / 60, secs % 60)
            }
            EtaDisplay::Unknown => f.write_str("--:--"),
            EtaDisplay::Complete => f.write_str("Complete"),
            EtaDisplay::Failed => f.write_str("Failed"),
        }
    }
}

/// Everything needed to create an acquisition
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionRequest {
    pub resource: ResourceReference,
    pub source_url: String,
    pub title: String,
    pub kind: MediaKind,
    pub quality: String,
}

impl AcquisitionRequest {
    pub fn transfer(&self) -> TransferRequest {
        TransferRequest {
            url: self.source_url.clone(),
            kind: self.kind,
            quality: self.quality.clone(),
        }
    }
}

/// One requested download and its live state
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionRecord {
    pub id: AcquisitionId,
    pub resource: ResourceReference,
    pub source_url: String,
    pub title: String,
    pub media_kind: MediaKind,
    pub quality: String,
    pub format_label: String,
    pub status: AcquisitionStatus,
    pub progress_percent: f32,
    /// Bytes per second; advisory
    pub transfer_rate: f64,
    pub eta: EtaDisplay,
    /// Name the artifact was saved under, once completed
    pub filename: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AcquisitionRecord {
    pub fn new(id: AcquisitionId, request: &AcquisitionRequest) -> Self {
        Self {
            id,
            resource: request.resource.clone(),
            source_url: request.source_url.clone(),
            title: request.title.clone(),
            media_kind: request.kind,
            quality: request.quality.clone(),
            format_label: request.kind.default_extension().to_string(),
            status: AcquisitionStatus::Queued,
            progress_percent: 0.0,
            transfer_rate: 0.0,
            eta: EtaDisplay::Starting,
            filename: None,
            created_at: Utc::now(),
        }
    }

    /// The request that produced this record, for explicit re-submission
    pub fn request(&self) -> AcquisitionRequest {
        AcquisitionRequest {
            resource: self.resource.clone(),
            source_url: self.source_url.clone(),
            title: self.title.clone(),
            kind: self.media_kind,
            quality: self.quality.clone(),
        }
    }

    /// Copy of this record after `transition`, with display fields set for
    /// the new status
    pub fn transition(&self, transition: Transition) -> Result<Self> {
        let mut next = self.clone();
        next.status = self.status.apply(&transition)?;

        match transition {
            Transition::Start => next.eta = EtaDisplay::Starting,
            Transition::Succeed => {
                next.progress_percent = 100.0;
                next.transfer_rate = 0.0;
                next.eta = EtaDisplay::Complete;
            }
            Transition::Fail(_) => {
                next.transfer_rate = 0.0;
                next.eta = EtaDisplay::Failed;
            }
            Transition::TogglePause | Transition::Cancel => {}
        }
        Ok(next)
    }

    /// Completed copy carrying the saved filename
    pub fn completed(&self, filename: String) -> Result<Self> {
        let mut next = self.transition(Transition::Succeed)?;
        next.filename = Some(filename);
        Ok(next)
    }

    /// Copy with advisory progress applied. Only in-flight records move;
    /// 100% is reserved for completion.
    pub fn with_progress(&self, progress: &TransferProgress) -> Self {
        let mut next = self.clone();
        if !matches!(
            self.status,
            AcquisitionStatus::Downloading | AcquisitionStatus::Paused
        ) {
            return next;
        }

        if let Some(percent) = progress.percentage() {
            next.progress_percent = (percent as f32).clamp(0.0, 99.0);
        }
        next.transfer_rate = progress.speed;
        next.eta = match progress.eta {
            Some(remaining) => EtaDisplay::Remaining(remaining),
            None => EtaDisplay::Unknown,
        };
        next
    }
}
