//! Output directory and temp-file lifecycle.
//!
//! Transfers stream into a uniquely tagged `.part` sibling of the final path
//! and are renamed into place once complete, so concurrent writers that map
//! to the same final name never interleave bytes.

mod writer;

pub use writer::PartFile;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::url_model::NAME_MAX;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: `<final>.<tag>.part` (e.g. `a.mp3` → `a.mp3.7.part`).
///
/// The final name is shortened (on a char boundary) when needed so the temp
/// name stays within NAME_MAX.
pub fn temp_path(final_path: &Path, tag: u64) -> PathBuf {
    let suffix = format!(".{}{}", tag, TEMP_SUFFIX);
    let name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut end = name.len().min(NAME_MAX.saturating_sub(suffix.len()));
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    final_path.with_file_name(format!("{}{}", &name[..end], suffix))
}

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    tracing::debug!(path = %dir.display(), "created output directory");
    Ok(())
}
