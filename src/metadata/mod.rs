pub mod client;
pub mod state;

pub use client::MetadataClient;
pub use state::{LoadedMetadata, MetadataState};
