//! Locate the asset element in page HTML and read its reference.

use scraper::{Html, Selector};

use super::{InspectionError, Locator};

/// Finds the first element matching `locator` and returns its `attribute`,
/// resolved against `page_ref` when relative.
pub fn locate_asset(
    html: &str,
    locator: &Locator,
    attribute: &str,
    page_ref: &str,
) -> Result<String, InspectionError> {
    let selector =
        Selector::parse(locator.as_str()).map_err(|e| InspectionError::Navigation {
            url: page_ref.to_string(),
            reason: format!("invalid locator: {}", e),
        })?;

    let document = Html::parse_document(html);
    let element =
        document
            .select(&selector)
            .next()
            .ok_or_else(|| InspectionError::ElementNotFound {
                url: page_ref.to_string(),
            })?;

    let raw = element.value().attr(attribute).map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Err(InspectionError::EmptyAssetReference {
            url: page_ref.to_string(),
            attribute: attribute.to_string(),
        });
    }
    Ok(resolve_reference(page_ref, raw))
}

/// Joins a possibly relative reference onto the page URL; returns `reference`
/// unchanged when either side does not parse.
pub fn resolve_reference(page_ref: &str, reference: &str) -> String {
    match url::Url::parse(page_ref) {
        Ok(base) => base
            .join(reference)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| reference.to_string()),
        Err(_) => reference.to_string(),
    }
}
