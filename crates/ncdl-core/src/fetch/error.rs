//! Failures originating at the fetch boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Why an asset could not be stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("download error for URL {url}: {reason}")]
    Transport { url: String, reason: String },
    /// HTTP response had a non-2xx status.
    #[error("download error for URL {url} (status {code})")]
    NonSuccessStatus { url: String, code: u32 },
    /// Disk write, sync or rename failed.
    #[error("failed to save {url} to {}: {reason}", .path.display())]
    StorageWrite {
        url: String,
        path: PathBuf,
        reason: String,
    },
}

impl FetchError {
    /// Asset reference the failure belongs to.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::NonSuccessStatus { url, .. }
            | FetchError::StorageWrite { url, .. } => url,
        }
    }

    /// HTTP status for `NonSuccessStatus`.
    pub fn status_code(&self) -> Option<u32> {
        match self {
            FetchError::NonSuccessStatus { code, .. } => Some(*code),
            _ => None,
        }
    }
}
