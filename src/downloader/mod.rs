//! Transfer progress, artifact naming and local save

pub mod filename;
pub mod progress;
pub mod sink;

// Re-export for convenience
pub use filename::{derive_filename, filename_from_disposition};
pub use progress::{format_rate, TransferProgress};
pub use sink::{sanitize_filename, DirectorySink, SaveSink};
