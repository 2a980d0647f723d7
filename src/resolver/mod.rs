//! URL resolution into typed resource references
//!
//! Resolution is pure: no network I/O, no shared state. Patterns are tried in a
//! fixed priority order and the first capture wins, so a watch URL carrying a
//! `list=` parameter resolves as a video, not a playlist.

use crate::utils::error::{MediaSuiteError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref PATTERNS: [(ResourceKind, Regex); 4] = [
        (
            ResourceKind::Video,
            Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/)([^&\s]+)").unwrap(),
        ),
        (
            ResourceKind::Playlist,
            Regex::new(r"youtube\.com/playlist\?list=([^&\s]+)").unwrap(),
        ),
        (
            ResourceKind::Channel,
            Regex::new(r"youtube\.com/@([^/\s]+)").unwrap(),
        ),
        (
            ResourceKind::Channel,
            Regex::new(r"youtube\.com/channel/([^/\s]+)").unwrap(),
        ),
    ];
}

/// What a resolved URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Video,
    Playlist,
    Channel,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Video => "video",
            ResourceKind::Playlist => "playlist",
            ResourceKind::Channel => "channel",
        }
    }

    /// Whether `id` lies in the capture class of this kind's patterns
    fn accepts_id(&self, id: &str) -> bool {
        let forbidden = |c: char| match self {
            ResourceKind::Video | ResourceKind::Playlist => c == '&' || c.is_whitespace(),
            ResourceKind::Channel => c == '/' || c.is_whitespace(),
        };
        !id.is_empty() && !id.contains(forbidden)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "video" => Ok(ResourceKind::Video),
            "playlist" => Ok(ResourceKind::Playlist),
            "channel" => Ok(ResourceKind::Channel),
            other => Err(format!("unknown resource kind: {}", other)),
        }
    }
}

/// Typed identifier for a video, playlist or channel.
///
/// Only [`resolve`] (and the history store, which persists resolver output)
/// construct these, so `id` is always a non-empty capture. There is no
/// `Deserialize` impl for the same reason.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceReference {
    kind: ResourceKind,
    id: String,
}

impl ResourceReference {
    /// Rebuild a reference from stored parts. The id must be something the
    /// resolver could have captured for `kind`.
    pub(crate) fn from_parts(kind: ResourceKind, id: String) -> Result<Self> {
        if !kind.accepts_id(&id) {
            return Err(MediaSuiteError::InvalidUrl(format!(
                "invalid {} id: {:?}",
                kind, id
            )));
        }
        Ok(Self { kind, id })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Resolve a raw URL string into a [`ResourceReference`].
///
/// Order: watch/short link, playlist, `@handle`, legacy `channel/` id.
pub fn resolve(raw_url: &str) -> Result<ResourceReference> {
    PATTERNS
        .iter()
        .find_map(|(kind, pattern)| {
            pattern
                .captures(raw_url)
                .and_then(|caps| caps.get(1))
                .map(|m| ResourceReference {
                    kind: *kind,
                    id: m.as_str().to_string(),
                })
        })
        .ok_or_else(|| MediaSuiteError::InvalidUrl(raw_url.to_string()))
}
