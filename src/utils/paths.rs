//! Platform path resolution
//!
//! All paths are resolved to absolute locations using the platform conventions
//! exposed by `dirs`. A process launched from a desktop shell may have `/` as its
//! working directory, so nothing here is ever relative.

use std::path::PathBuf;
use tracing::{debug, warn};

/// Get the application data directory, creating it if needed.
///
/// Returns: `{data_dir}/MediaSuite/`
pub fn get_app_support_dir() -> PathBuf {
    let dir = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .unwrap_or_else(std::env::temp_dir)
        .join("MediaSuite");

    if let Err(e) = std::fs::create_dir_all(&dir) {
        warn!("Failed to create app data directory {:?}: {}", dir, e);
    }

    debug!("App data directory: {:?}", dir);
    dir
}

/// Get the history database path.
///
/// Returns: `{data_dir}/MediaSuite/history.db`
pub fn get_database_path() -> PathBuf {
    get_app_support_dir().join("history.db")
}

/// Get the downloads directory.
///
/// Falls back to `~/Downloads`, then the system temp directory.
pub fn get_downloads_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| {
            warn!("Could not determine Downloads directory, using temp dir");
            std::env::temp_dir()
        })
}
