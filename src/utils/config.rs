//! Application configuration

use crate::utils::paths::{get_database_path, get_downloads_dir};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the backend base URL
pub const API_URL_ENV: &str = "MEDIASUITE_API_URL";

/// Environment variable overriding the download location
pub const DOWNLOAD_DIR_ENV: &str = "MEDIASUITE_DOWNLOAD_DIR";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Base URL of the media backend (`/api/...` endpoints live under it)
    pub api_base_url: String,

    /// Where completed artifacts are saved
    pub download_location: PathBuf,

    /// How long a notification stays active, in seconds
    pub notification_ttl_secs: u64,

    /// Write completed acquisitions through to the history database
    pub persist_history: bool,

    /// History database file
    pub history_db_path: PathBuf,

    /// Video qualities offered before any metadata is loaded
    pub default_video_qualities: Vec<String>,

    /// Audio qualities offered before any metadata is loaded
    pub default_audio_qualities: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            download_location: get_downloads_dir(),
            notification_ttl_secs: 4,
            persist_history: true,
            history_db_path: get_database_path(),
            default_video_qualities: ["best", "1080p", "720p", "480p", "360p"]
                .iter()
                .map(|q| q.to_string())
                .collect(),
            default_audio_qualities: ["best", "192k", "128k", "96k"]
                .iter()
                .map(|q| q.to_string())
                .collect(),
        }
    }
}

impl AppSettings {
    /// Defaults overlaid with `MEDIASUITE_*` environment variables
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                settings.api_base_url = url.trim().to_string();
            }
        }
        if let Ok(dir) = std::env::var(DOWNLOAD_DIR_ENV) {
            if !dir.trim().is_empty() {
                settings.download_location = PathBuf::from(dir.trim());
            }
        }
        settings
    }

    /// Notification lifetime
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_ttl_secs.max(1))
    }

    /// Base URL without a trailing slash
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}
