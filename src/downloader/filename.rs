//! Filename recovery from content-disposition headers

use crate::api::MediaKind;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    // RFC 5987 extended form first, then quoted or bare `filename=`.
    static ref DISPOSITION_RE: Regex =
        Regex::new(r#"(?i)filename\*=UTF-8''([^;]+)|filename="?([^";]+)"?"#).unwrap();
}

/// Extract a percent-decoded filename from a content-disposition value.
///
/// Returns `None` when no filename parameter is present or the decoded
/// result is empty or not valid UTF-8.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let caps = DISPOSITION_RE.captures(header)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();

    let decoded = match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            debug!("Undecodable filename {:?} in content-disposition: {}", raw, e);
            return None;
        }
    };

    let decoded = decoded.trim();
    if decoded.is_empty() {
        None
    } else {
        Some(decoded.to_string())
    }
}

/// Name to save an artifact under: the server suggestion, or `download.<ext>`.
pub fn derive_filename(content_disposition: Option<&str>, kind: MediaKind) -> String {
    content_disposition
        .and_then(filename_from_disposition)
        .unwrap_or_else(|| format!("download.{}", kind.default_extension()))
}
