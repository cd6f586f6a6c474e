//! Default target filename derivation from the source URL.

/// Fallback name when the URL path has no usable last segment.
pub const FALLBACK_TARGET_NAME: &str = "download.bin";

/// Derives a target filename from the URL's last path segment, ignoring the
/// query string. Falls back to [`FALLBACK_TARGET_NAME`] for root paths,
/// unparseable URLs, and dot segments.
pub fn default_target_name(url: &str) -> String {
    segment_from_url(url).unwrap_or_else(|| FALLBACK_TARGET_NAME.to_string())
}

fn segment_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path().split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}
