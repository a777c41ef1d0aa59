//! Static-HTML page inspector backed by libcurl.
//!
//! Fetches the page with a blocking GET on the blocking pool, then hands the
//! body to `locate_asset`. The transfer polls the request's `AbortToken`
//! from the progress callback and stops once the worker has given up.

use async_trait::async_trait;
use std::time::Duration;

use super::{locate_asset, InspectRequest, InspectionError, PageInspector};
use crate::control::AbortToken;

/// Upper bound on a page body kept in memory.
pub const DEFAULT_MAX_PAGE_BYTES: usize = 8 * 1024 * 1024;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct CurlInspector {
    attribute: String,
    user_agent: Option<String>,
    max_page_bytes: usize,
}

impl CurlInspector {
    /// Inspector reading the asset reference from `attribute` (e.g. `data-src`).
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            user_agent: None,
            max_page_bytes: DEFAULT_MAX_PAGE_BYTES,
        }
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_max_page_bytes(mut self, max: usize) -> Self {
        self.max_page_bytes = max;
        self
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }
}

#[async_trait]
impl PageInspector for CurlInspector {
    async fn inspect(&self, request: &InspectRequest) -> Result<String, InspectionError> {
        let url = request.page_ref.clone();
        let timeout = request.page_load_timeout;
        let abort = request.abort.clone();
        let user_agent = self.user_agent.clone();
        let max = self.max_page_bytes;

        let html = tokio::task::spawn_blocking(move || {
            load_page(&url, timeout, &abort, user_agent.as_deref(), max)
        })
        .await
        .map_err(|e| InspectionError::Navigation {
            url: request.page_ref.clone(),
            reason: format!("page load task: {}", e),
        })??;

        tracing::debug!(
            url = %request.page_ref,
            bytes = html.len(),
            "page loaded, locating asset element"
        );
        locate_asset(&html, &request.locator, &self.attribute, &request.page_ref)
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
    easy.progress(true)?;
    if let Some(ua) = user_agent {
        easy.useragent(ua)?;
    }
    Ok(())
}

/// Blocking GET of `url`. Returns the body as (lossy) UTF-8.
fn load_page(
    url: &str,
    timeout: Duration,
    abort: &AbortToken,
    user_agent: Option<&str>,
    max_bytes: usize,
) -> Result<String, InspectionError> {
    let navigation = |reason: String| InspectionError::Navigation {
        url: url.to_string(),
        reason,
    };

    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, timeout, user_agent).map_err(|e| navigation(e.to_string()))?;

    let mut body: Vec<u8> = Vec::new();
    let mut too_large = false;
    let performed = {
        let mut transfer = easy.transfer();
        let setup = transfer
            .write_function(|data| {
                if body.len() + data.len() > max_bytes {
                    too_large = true;
                    return Ok(0);
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .and_then(|()| transfer.progress_function(|_, _, _, _| !abort.is_aborted()));
        match setup {
            Ok(()) => transfer.perform(),
            Err(e) => Err(e),
        }
    };

    if let Err(e) = performed {
        let reason = if too_large {
            format!("page body exceeds {} bytes", max_bytes)
        } else if e.is_aborted_by_callback() {
            "page load abandoned".to_string()
        } else if e.is_operation_timedout() {
            format!("page load timed out after {}ms", timeout.as_millis())
        } else {
            e.to_string()
        };
        return Err(navigation(reason));
    }

    let code = easy
        .response_code()
        .map_err(|e| navigation(format!("no response code: {}", e)))?;
    if !(200..300).contains(&code) {
        return Err(navigation(format!("HTTP {}", code)));
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}
