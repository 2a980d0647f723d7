pub mod http;
pub mod models;
pub mod traits;

pub use http::HttpBackend;
pub use models::{
    MediaKind, MediaMetadata, TransferPayload, TransferRequest, UpdateResponse, BEST_QUALITY,
};
pub use traits::MediaBackend;
