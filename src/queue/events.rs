use crate::queue::record::{AcquisitionId, AcquisitionRecord, AcquisitionStatus, EtaDisplay};
use chrono::{DateTime, Utc};

/// Events that describe changes in the acquisition queue
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// A new acquisition was created
    Added {
        record: AcquisitionRecord,
        timestamp: DateTime<Utc>,
    },
    /// A user-driven status change (start, pause, resume)
    StatusChanged {
        id: AcquisitionId,
        status: AcquisitionStatus,
        timestamp: DateTime<Utc>,
    },
    /// Advisory transfer progress
    Progress {
        id: AcquisitionId,
        percent: f32,
        /// Bytes per second
        rate: f64,
        eta: EtaDisplay,
    },
    /// The payload was saved and the acquisition entered history
    Completed {
        id: AcquisitionId,
        filename: String,
        timestamp: DateTime<Utc>,
    },
    Failed {
        id: AcquisitionId,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// The acquisition was cancelled and dropped from the queue
    Removed {
        id: AcquisitionId,
        timestamp: DateTime<Utc>,
    },
}

impl QueueEvent {
    pub fn acquisition_id(&self) -> AcquisitionId {
        match self {
            QueueEvent::Added { record, .. } => record.id,
            QueueEvent::StatusChanged { id, .. }
            | QueueEvent::Progress { id, .. }
            | QueueEvent::Completed { id, .. }
            | QueueEvent::Failed { id, .. }
            | QueueEvent::Removed { id, .. } => *id,
        }
    }
}
