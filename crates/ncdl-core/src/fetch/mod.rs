//! Fetch capability: download an asset reference into a directory.

mod curl;
mod error;

pub use self::curl::CurlFetcher;
pub use error::FetchError;

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A stored asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedFile {
    /// Final location, `dest_dir` joined with the derived filename.
    pub path: PathBuf,
    pub bytes: u64,
    /// Hex SHA-256 of the stored content.
    pub sha256: String,
}

/// Downloads an asset and stores it under a directory.
///
/// The stored filename is derived from the asset reference
/// (see `url_model::derive_filename`).
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, asset_ref: &str, dest_dir: &Path) -> Result<FetchedFile, FetchError>;
}
