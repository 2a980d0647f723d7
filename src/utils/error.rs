//! Error handling for MediaSuite

use crate::queue::AcquisitionId;
use thiserror::Error;

/// Main error type for MediaSuite
#[derive(Debug, Error)]
pub enum MediaSuiteError {
    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("Please scan the video first by clicking \"Get Info\"")]
    MetadataNotLoaded,

    #[error("{0}")]
    MetadataFetchFailed(String),

    #[error("{0}")]
    TransferFailed(String),

    #[error("{0}")]
    UpdateFailed(String),

    #[error("Acquisition not found: {0}")]
    AcquisitionNotFound(AcquisitionId),

    #[error("Cannot {action} an acquisition that is {from}")]
    InvalidTransition { from: String, action: &'static str },

    #[error("Quality {0} is not offered for this media")]
    UnknownQuality(String),

    #[error("History store error: {0}")]
    HistoryStore(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result alias used throughout the orchestrator core
pub type Result<T> = std::result::Result<T, MediaSuiteError>;
