//! libcurl-backed fetcher.
//!
//! Streams the body into a tagged `.part` file, hashing as it goes, and
//! renames onto the final name only after a 2xx response completed.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::{FetchError, FetchedFile, Fetcher};
use crate::storage::{self, PartFile};
use crate::url_model::derive_filename;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Distinguishes temp files of concurrent transfers to the same final name.
static TEMP_TAG: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct CurlFetcher {
    timeout: Duration,
    user_agent: Option<String>,
}

impl CurlFetcher {
    /// Fetcher whose transfers are bounded by `timeout` overall.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            user_agent: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Fetcher for CurlFetcher {
    async fn fetch(&self, asset_ref: &str, dest_dir: &Path) -> Result<FetchedFile, FetchError> {
        let url = asset_ref.to_string();
        let dir = dest_dir.to_path_buf();
        let timeout = self.timeout;
        let user_agent = self.user_agent.clone();

        tokio::task::spawn_blocking(move || {
            download_to_dir(&url, &dir, timeout, user_agent.as_deref())
        })
        .await
        .map_err(|e| FetchError::Transport {
            url: asset_ref.to_string(),
            reason: format!("download task: {}", e),
        })?
    }
}

fn configure(
    easy: &mut curl::easy::Easy,
    url: &str,
    timeout: Duration,
    user_agent: Option<&str>,
) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(timeout.min(CONNECT_TIMEOUT))?;
    easy.timeout(timeout)?;
    if let Some(ua) = user_agent {
        easy.useragent(ua)?;
    }
    Ok(())
}

/// Blocking GET of `url` into `dir`. Runs on the current thread.
fn download_to_dir(
    url: &str,
    dir: &Path,
    timeout: Duration,
    user_agent: Option<&str>,
) -> Result<FetchedFile, FetchError> {
    let final_path = dir.join(derive_filename(url));
    let storage_error = |e: io::Error| FetchError::StorageWrite {
        url: url.to_string(),
        path: final_path.clone(),
        reason: e.to_string(),
    };
    let transport_error = |e: curl::Error| FetchError::Transport {
        url: url.to_string(),
        reason: e.to_string(),
    };

    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, timeout, user_agent).map_err(transport_error)?;

    let tag = TEMP_TAG.fetch_add(1, Ordering::Relaxed);
    let mut part = PartFile::create(&storage::temp_path(&final_path, tag)).map_err(storage_error)?;
    let mut hasher = Sha256::new();
    let mut write_failure: Option<io::Error> = None;

    let performed = {
        let mut transfer = easy.transfer();
        match transfer.write_function(|data| match part.append(data) {
            Ok(()) => {
                hasher.update(data);
                Ok(data.len())
            }
            Err(e) => {
                write_failure = Some(e);
                Ok(0)
            }
        }) {
            Ok(()) => transfer.perform(),
            Err(e) => Err(e),
        }
    };

    if let Err(e) = performed {
        part.discard();
        if let Some(io_err) = write_failure {
            return Err(storage_error(io_err));
        }
        return Err(transport_error(e));
    }

    let code = match easy.response_code() {
        Ok(code) => code,
        Err(e) => {
            part.discard();
            return Err(transport_error(e));
        }
    };
    if !(200..300).contains(&code) {
        part.discard();
        return Err(FetchError::NonSuccessStatus {
            url: url.to_string(),
            code,
        });
    }

    let bytes = part.written();
    part.finalize(&final_path).map_err(storage_error)?;
    tracing::debug!(url = %url, path = %final_path.display(), bytes, "asset stored");

    Ok(FetchedFile {
        path: final_path,
        bytes,
        sha256: hex::encode(hasher.finalize()),
    })
}
