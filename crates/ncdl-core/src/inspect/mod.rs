//! Page-inspection capability.
//!
//! Given a page reference and a locator, produce the asset reference held by
//! the located element. The worker pool only depends on `PageInspector`;
//! `CurlInspector` is the production implementation.

mod curl;
mod error;
mod locate;

pub use self::curl::CurlInspector;
pub use error::InspectionError;
pub use locate::{locate_asset, resolve_reference};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::control::AbortToken;

/// Validated CSS selector used to find the asset element on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator(String);

#[derive(Debug, Error)]
#[error("invalid locator {selector:?}: {reason}")]
pub struct LocatorError {
    pub selector: String,
    pub reason: String,
}

impl Locator {
    pub fn parse(selector: &str) -> Result<Self, LocatorError> {
        let selector = selector.trim();
        scraper::Selector::parse(selector).map_err(|e| LocatorError {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(selector.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything an inspector needs for one page.
#[derive(Debug, Clone)]
pub struct InspectRequest {
    pub page_ref: String,
    pub locator: Locator,
    /// Bound on loading the page itself.
    pub page_load_timeout: Duration,
    /// Bound the worker applies to the whole inspection.
    pub element_wait_timeout: Duration,
    /// Tripped by the worker once it stops waiting for this request.
    pub abort: AbortToken,
}

/// Finds the asset reference on a page.
#[async_trait]
pub trait PageInspector: Send + Sync {
    async fn inspect(&self, request: &InspectRequest) -> Result<String, InspectionError>;
}
