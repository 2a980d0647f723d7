//! Utility modules for error handling, configuration and paths

pub mod config;
pub mod error;
pub mod paths;

// Re-export for convenience
pub use config::AppSettings;
pub use error::{MediaSuiteError, Result};
pub use paths::{get_app_support_dir, get_database_path, get_downloads_dir};
