//! Asset reference → local filename.
//!
//! The stored name is derived from the asset reference alone, so two assets
//! with the same trailing segment map to the same file (last writer wins).

mod path;
mod sanitize;

pub use path::{filename_from_url_path, last_segment};
pub use sanitize::{sanitize_filename_for_linux, NAME_MAX};

/// Fallback when the asset reference yields nothing usable.
const DEFAULT_FILENAME: &str = "download.bin";

/// Derives a safe filename for saving the asset at `asset_ref`.
///
/// Uses the last path segment of the parsed URL (query and fragment ignored).
/// References that do not parse as URLs fall back to the text after the last
/// `/`. The result is sanitized for Linux.
///
/// - `derive_filename("https://cdn.example.com/audio/a.mp3")` → `"a.mp3"`
/// - `derive_filename("https://example.com/")` → `"download.bin"`
pub fn derive_filename(asset_ref: &str) -> String {
    let candidate = match url::Url::parse(asset_ref) {
        Ok(_) => filename_from_url_path(asset_ref),
        Err(_) => last_segment(asset_ref),
    };

    let Some(raw) = candidate else {
        return DEFAULT_FILENAME.to_string();
    };

    let sanitized = sanitize_filename_for_linux(&raw);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        DEFAULT_FILENAME.to_string()
    } else {
        sanitized
    }
}
