//! Data structures exchanged with the media backend

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel quality used when the backend reports none
pub const BEST_QUALITY: &str = "best";

/// Kind of artifact an acquisition produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    /// Container extension used when the server suggests no filename
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            other => Err(format!("unknown media kind: {}", other)),
        }
    }
}

/// Descriptive metadata and quality options for a resolved resource.
///
/// Both quality lists always hold at least one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: String,
    pub uploader_name: String,
    pub duration_label: String,
    pub view_count: Option<u64>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub available_video_qualities: Vec<String>,
    pub available_audio_qualities: Vec<String>,
}

impl MediaMetadata {
    /// Qualities offered for a given media kind
    pub fn qualities_for(&self, kind: MediaKind) -> &[String] {
        match kind {
            MediaKind::Video => &self.available_video_qualities,
            MediaKind::Audio => &self.available_audio_qualities,
        }
    }

    /// First entry of the video quality list
    pub fn first_video_quality(&self) -> &str {
        self.available_video_qualities
            .first()
            .map(String::as_str)
            .unwrap_or(BEST_QUALITY)
    }
}

fn non_empty_or_best(qualities: Option<Vec<String>>) -> Vec<String> {
    match qualities {
        Some(list) if !list.is_empty() => list,
        _ => vec![BEST_QUALITY.to_string()],
    }
}

/// Raw body of `GET /api/video-info`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfoResponse {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub duration_string: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub available_video_qualities: Option<Vec<String>>,
    #[serde(default)]
    pub available_audio_qualities: Option<Vec<String>>,
}

impl From<VideoInfoResponse> for MediaMetadata {
    fn from(raw: VideoInfoResponse) -> Self {
        Self {
            title: raw
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            uploader_name: raw.uploader.unwrap_or_default(),
            duration_label: raw.duration_string.unwrap_or_default(),
            view_count: raw.view_count,
            description: raw.description,
            thumbnail_url: raw.thumbnail,
            available_video_qualities: non_empty_or_best(raw.available_video_qualities),
            available_audio_qualities: non_empty_or_best(raw.available_audio_qualities),
        }
    }
}

/// Error body returned with a non-success status
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /api/update-ytdlp`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Parameters of one transfer request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub url: String,
    pub kind: MediaKind,
    pub quality: String,
}

/// A fully received transfer body
#[derive(Debug, Clone, Default)]
pub struct TransferPayload {
    pub body: Vec<u8>,
    /// Raw content-disposition header, if the server sent one
    pub content_disposition: Option<String>,
}
