//! Filename hints from asset references.

/// Last non-empty path segment of a parsed URL.
///
/// Returns `None` if the URL cannot be parsed or the path is empty/root.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    match segment {
        "." | ".." => None,
        s => Some(s.to_string()),
    }
}

/// Text after the last `/` of a reference that is not an absolute URL.
pub fn last_segment(reference: &str) -> Option<String> {
    let tail = match reference.rfind('/') {
        Some(i) => &reference[i + 1..],
        None => reference,
    };
    if tail.is_empty() {
        None
    } else {
        Some(tail.to_string())
    }
}
