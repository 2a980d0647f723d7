//! HTTP implementation of the media backend

use crate::api::models::{
    ErrorResponse, MediaMetadata, TransferPayload, TransferRequest, UpdateResponse,
    VideoInfoResponse,
};
use crate::api::traits::MediaBackend;
use crate::downloader::TransferProgress;
use crate::utils::error::{MediaSuiteError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const INFO_FALLBACK: &str = "Failed to fetch video info";
const INFO_UNREACHABLE: &str = "Failed to fetch video info. Make sure the server is running.";
const DOWNLOAD_FALLBACK: &str = "Download request failed";
const UPDATE_FALLBACK: &str = "Failed to update yt-dlp";

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Talks to the `/api/*` endpoints of the media backend.
///
/// No request timeout is configured: a hung backend suspends the caller.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend rooted at `base_url` (e.g. `http://127.0.0.1:5000`)
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("mediasuite/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl MediaBackend for HttpBackend {
    fn id(&self) -> &'static str {
        "http"
    }

    async fn video_info(&self, url: &str) -> Result<MediaMetadata> {
        debug!("Requesting video info for {}", url);

        let response = self
            .client
            .get(self.endpoint("/api/video-info"))
            .query(&[("url", url)])
            .send()
            .await
            .map_err(|e| {
                warn!("Video info request failed: {}", e);
                MediaSuiteError::MetadataFetchFailed(INFO_UNREACHABLE.to_string())
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!("Failed to read video info body: {}", e);
            MediaSuiteError::MetadataFetchFailed(INFO_UNREACHABLE.to_string())
        })?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| INFO_FALLBACK.to_string());
            debug!("Video info returned {}: {}", status, message);
            return Err(MediaSuiteError::MetadataFetchFailed(message));
        }

        let raw: VideoInfoResponse = serde_json::from_slice(&body).map_err(|e| {
            warn!("Malformed video info body: {}", e);
            MediaSuiteError::MetadataFetchFailed(INFO_FALLBACK.to_string())
        })?;

        Ok(raw.into())
    }

    async fn download(
        &self,
        request: &TransferRequest,
        progress_tx: mpsc::Sender<TransferProgress>,
    ) -> Result<TransferPayload> {
        debug!(
            "Requesting {} at quality {} for {}",
            request.kind, request.quality, request.url
        );

        let response = self
            .client
            .get(self.endpoint("/api/download"))
            .query(&[
                ("url", request.url.as_str()),
                ("type", request.kind.as_str()),
                ("quality", request.quality.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MediaSuiteError::TransferFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = if text.trim().is_empty() {
                DOWNLOAD_FALLBACK.to_string()
            } else {
                text.trim().to_string()
            };
            debug!("Download returned {}: {}", status, message);
            return Err(MediaSuiteError::TransferFailed(message));
        }

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut progress = TransferProgress::new(response.content_length());
        if progress_tx.send(progress.clone()).await.is_err() {
            debug!("Progress receiver dropped before transfer started");
        }

        let capacity = progress.total_bytes.unwrap_or(0).min(64 * 1024 * 1024) as usize;
        let mut body = Vec::with_capacity(capacity);

        let start_time = Instant::now();
        let mut last_update_time = start_time;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| MediaSuiteError::TransferFailed(e.to_string()))?;
            body.extend_from_slice(&chunk);

            let now = Instant::now();
            if now.duration_since(last_update_time) >= PROGRESS_INTERVAL {
                let elapsed = now.duration_since(start_time).as_secs_f64();
                let speed = if elapsed > 0.0 {
                    body.len() as f64 / elapsed
                } else {
                    0.0
                };
                progress.update(body.len() as u64, speed);
                // Best-effort: a dropped receiver must not abort the transfer
                let _ = progress_tx.send(progress.clone()).await;
                last_update_time = now;
            }
        }

        let elapsed = start_time.elapsed().as_secs_f64();
        let speed = if elapsed > 0.0 {
            body.len() as f64 / elapsed
        } else {
            0.0
        };
        progress.update(body.len() as u64, speed);
        let _ = progress_tx.send(progress).await;

        debug!("Received {} bytes for {}", body.len(), request.url);
        Ok(TransferPayload {
            body,
            content_disposition,
        })
    }

    async fn update_tool(&self) -> Result<UpdateResponse> {
        let response = self
            .client
            .post(self.endpoint("/api/update-ytdlp"))
            .send()
            .await
            .map_err(|e| {
                warn!("Update request failed: {}", e);
                MediaSuiteError::UpdateFailed(UPDATE_FALLBACK.to_string())
            })?;

        let body = response
            .bytes()
            .await
            .map_err(|_| MediaSuiteError::UpdateFailed(UPDATE_FALLBACK.to_string()))?;

        serde_json::from_slice::<UpdateResponse>(&body).map_err(|e| {
            warn!("Malformed update response: {}", e);
            MediaSuiteError::UpdateFailed(UPDATE_FALLBACK.to_string())
        })
    }
}
