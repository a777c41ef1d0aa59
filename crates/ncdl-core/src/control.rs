//! Abort tokens for abandoned work.
//!
//! A worker that gives up on a slow inspection trips the token carried by the
//! request. The abandoned operation keeps running unless it checks the token;
//! the curl-based inspector polls it from libcurl's progress callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag, set once, observed by any clone.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    flag: Arc<AtomicBool>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort. Idempotent.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
