//! Failures originating at the page-inspection boundary.

use std::time::Duration;
use thiserror::Error;

/// Why no asset reference could be obtained from a page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectionError {
    /// Page could not be loaded (transport error, non-2xx, page-load timeout, oversize body).
    #[error("failed to load page {url}: {reason}")]
    Navigation { url: String, reason: String },
    /// Inspection did not finish within the element-wait window.
    #[error("asset element detection timed out after {}ms: {url}", .waited.as_millis())]
    ElementTimeout { url: String, waited: Duration },
    /// Page loaded but nothing matched the locator.
    #[error("asset element not found on {url}")]
    ElementNotFound { url: String },
    /// Element found but its asset attribute is missing or blank.
    #[error("asset URL not found on {url} ({attribute} attribute is empty)")]
    EmptyAssetReference { url: String, attribute: String },
}

impl InspectionError {
    /// Page reference the failure belongs to.
    pub fn url(&self) -> &str {
        match self {
            InspectionError::Navigation { url, .. }
            | InspectionError::ElementTimeout { url, .. }
            | InspectionError::ElementNotFound { url }
            | InspectionError::EmptyAssetReference { url, .. } => url,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, InspectionError::ElementTimeout { .. })
    }
}
