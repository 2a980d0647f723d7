//! Progress tracking for transfers

use std::time::Duration;

/// Progress snapshot reported while a transfer body is being received
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferProgress {
    /// Unknown when the server sent no content-length
    pub total_bytes: Option<u64>,
    pub downloaded_bytes: u64,
    pub speed: f64, // bytes per second
    pub eta: Option<Duration>,
}

impl TransferProgress {
    /// Create a new progress tracker
    pub fn new(total_bytes: Option<u64>) -> Self {
        Self {
            total_bytes,
            ..Default::default()
        }
    }

    /// Update progress with new data
    pub fn update(&mut self, downloaded_bytes: u64, speed: f64) {
        self.downloaded_bytes = downloaded_bytes;
        self.speed = speed;

        self.eta = match self.total_bytes {
            Some(total) if downloaded_bytes >= total => Some(Duration::from_secs(0)),
            Some(total) if speed > 0.0 => {
                let remaining = total - downloaded_bytes;
                Some(Duration::from_secs_f64(remaining as f64 / speed))
            }
            _ => None,
        };
    }

    /// Progress percentage (0.0 to 100.0), if the total is known
    pub fn percentage(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) | None => None,
            Some(total) => Some((self.downloaded_bytes as f64 / total as f64 * 100.0).min(100.0)),
        }
    }
}

/// Human-readable transfer rate, e.g. `2.50 MB/s`
pub fn format_rate(bytes_per_second: f64) -> String {
    format!("{:.2} MB/s", bytes_per_second.max(0.0) / 1024.0 / 1024.0)
}
