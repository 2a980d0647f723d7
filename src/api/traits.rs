use crate::api::models::{MediaMetadata, TransferPayload, TransferRequest, UpdateResponse};
use crate::downloader::TransferProgress;
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Boundary to the media backend
///
/// The orchestrator never extracts or transcodes media itself; everything that
/// touches the network goes through this trait so the HTTP implementation can
/// be swapped for an in-process one.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Returns a short identifier for logging (e.g. "http")
    fn id(&self) -> &'static str;

    /// Fetches descriptive metadata for a URL.
    ///
    /// Fails with `MetadataFetchFailed` carrying the server message, or a
    /// generic one when the server gave none.
    async fn video_info(&self, url: &str) -> Result<MediaMetadata>;

    /// Requests an artifact and receives its whole body.
    ///
    /// Progress is best-effort; the sender is dropped when the transfer ends.
    /// Fails with `TransferFailed`.
    async fn download(
        &self,
        request: &TransferRequest,
        progress_tx: mpsc::Sender<TransferProgress>,
    ) -> Result<TransferPayload>;

    /// Asks the backend to update its extraction tool
    async fn update_tool(&self) -> Result<UpdateResponse>;
}
