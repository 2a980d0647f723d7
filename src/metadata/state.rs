//! Per-session URL, metadata and quality selection

use crate::api::{MediaKind, MediaMetadata};
use crate::resolver::ResourceReference;
use crate::utils::config::AppSettings;
use crate::utils::error::{MediaSuiteError, Result};

/// Metadata loaded for the current URL, with the resource it resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMetadata {
    pub resource: ResourceReference,
    pub metadata: MediaMetadata,
}

#[derive(Debug, Clone)]
pub struct MetadataState {
    url: String,
    loaded: Option<LoadedMetadata>,
    download_kind: MediaKind,
    selected_quality: String,
    default_video_qualities: Vec<String>,
    default_audio_qualities: Vec<String>,
}

impl MetadataState {
    pub fn new(settings: &AppSettings) -> Self {
        let default_video_qualities = settings.default_video_qualities.clone();
        let selected_quality = default_video_qualities
            .first()
            .cloned()
            .unwrap_or_else(|| crate::api::BEST_QUALITY.to_string());

        Self {
            url: String::new(),
            loaded: None,
            download_kind: MediaKind::Video,
            selected_quality,
            default_video_qualities,
            default_audio_qualities: settings.default_audio_qualities.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Change the current URL. Metadata loaded for a different URL no longer
    /// applies and is dropped.
    pub fn set_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        if url != self.url {
            self.loaded = None;
        }
        self.url = url;
    }

    pub fn loaded(&self) -> Option<&LoadedMetadata> {
        self.loaded.as_ref()
    }

    pub fn metadata(&self) -> Option<&MediaMetadata> {
        self.loaded.as_ref().map(|l| &l.metadata)
    }

    /// Install freshly fetched metadata for `url` and reset the quality to
    /// the first video quality. Ignored (returns false) if the URL changed
    /// while the fetch was in flight.
    pub fn apply(&mut self, url: &str, loaded: LoadedMetadata) -> bool {
        if url != self.url {
            return false;
        }
        self.selected_quality = loaded.metadata.first_video_quality().to_string();
        self.loaded = Some(loaded);
        true
    }

    pub fn download_kind(&self) -> MediaKind {
        self.download_kind
    }

    /// Switch kind; a selection the new kind does not offer falls back to
    /// its first quality
    pub fn set_download_kind(&mut self, kind: MediaKind) {
        self.download_kind = kind;
        if !self.available_qualities().contains(&self.selected_quality) {
            if let Some(first) = self.available_qualities().first().cloned() {
                self.selected_quality = first;
            }
        }
    }

    /// Qualities offered for the current kind: from metadata once loaded,
    /// the configured defaults before that
    pub fn available_qualities(&self) -> &[String] {
        match (&self.loaded, self.download_kind) {
            (Some(loaded), kind) => loaded.metadata.qualities_for(kind),
            (None, MediaKind::Video) => &self.default_video_qualities,
            (None, MediaKind::Audio) => &self.default_audio_qualities,
        }
    }

    pub fn selected_quality(&self) -> &str {
        &self.selected_quality
    }

    pub fn select_quality(&mut self, quality: &str) -> Result<()> {
        if !self.available_qualities().iter().any(|q| q == quality) {
            return Err(MediaSuiteError::UnknownQuality(quality.to_string()));
        }
        self.selected_quality = quality.to_string();
        Ok(())
    }
}
