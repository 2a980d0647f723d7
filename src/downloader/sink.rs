//! Local persistence of received artifacts

use crate::utils::error::Result;
use std::path::PathBuf;
use tracing::info;

/// Where completed artifacts are written.
///
/// `save` is synchronous and may block; the lifecycle manager calls it on
/// tokio's blocking pool. The only way it reports a problem is by returning
/// an error, which fails the acquisition. Saving the same name twice
/// overwrites.
pub trait SaveSink: Send + Sync {
    fn save(&self, blob: &[u8], filename: &str) -> Result<()>;
}

/// Saves artifacts into a single user-visible directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Final location for a suggested filename
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(sanitize_filename(filename))
    }
}

impl SaveSink for DirectorySink {
    fn save(&self, blob: &[u8], filename: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(filename);
        std::fs::write(&path, blob)?;
        info!("Saved {} bytes to {:?}", blob.len(), path);
        Ok(())
    }
}

/// Strip path components and characters that are invalid on common filesystems
pub fn sanitize_filename(name: &str) -> String {
    let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];

    let mut sanitized: String = name
        .replace("..", "")
        .chars()
        .map(|c| if invalid_chars.contains(&c) { '_' } else { c })
        .collect();

    // No hidden files, no trailing dots or spaces (Windows)
    sanitized = sanitized
        .trim()
        .trim_start_matches('.')
        .trim_end_matches('.')
        .trim_end()
        .to_string();

    while sanitized.contains("__") {
        sanitized = sanitized.replace("__", "_");
    }

    if sanitized.is_empty() || sanitized == "_" {
        "download".to_string()
    } else {
        sanitized
    }
}
