//! Metadata fetches, gated by URL resolution

use crate::api::{MediaBackend, MediaMetadata};
use crate::resolver::{resolve, ResourceReference};
use crate::utils::error::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub struct MetadataClient {
    backend: Arc<dyn MediaBackend>,
    in_flight: Arc<AtomicUsize>,
}

/// Marks a fetch as in flight until dropped, whichever way the fetch ends
struct LoadingGuard(Arc<AtomicUsize>);

impl LoadingGuard {
    fn engage(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MetadataClient {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// True while any fetch is outstanding
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Resolve `raw_url` and fetch its metadata.
    ///
    /// A URL the resolver rejects fails with `InvalidUrl` before any request
    /// is made.
    pub async fn fetch(&self, raw_url: &str) -> Result<(ResourceReference, MediaMetadata)> {
        let resource = resolve(raw_url)?;
        debug!("Fetching metadata for {} via {}", resource, self.backend.id());

        let _loading = LoadingGuard::engage(&self.in_flight);
        let metadata = self.backend.video_info(raw_url).await?;

        info!("Loaded metadata for {}: {}", resource, metadata.title);
        Ok((resource, metadata))
    }
}
