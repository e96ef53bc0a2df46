//! URL handling for store and category links read off the page.

use url::Url;

use crate::error::ScraperError;

/// The store id taken from a store link, e.g. `177` in `/stores/177/...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreReference {
    pub store_id: String,
    /// The link as it appeared on the landing page.
    pub link: String,
}

impl StoreReference {
    /// Parses the second path segment of `link`, resolved against `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidLink`] if the link does not parse or
    /// has no non-empty second path segment.
    pub fn from_link(origin: &str, link: &str) -> Result<Self, ScraperError> {
        let url = resolve_link(origin, link)?;
        let store_id = url
            .path_segments()
            .and_then(|mut segments| segments.nth(1))
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| ScraperError::InvalidLink {
                url: link.to_owned(),
                reason: "no store id in second path segment".to_owned(),
            })?;

        Ok(Self {
            store_id: store_id.to_owned(),
            link: link.to_owned(),
        })
    }
}

/// Resolves an absolute or root-relative link against the site origin.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidLink`] if either input fails to parse.
pub fn resolve_link(origin: &str, link: &str) -> Result<Url, ScraperError> {
    let base = Url::parse(origin).map_err(|e| ScraperError::InvalidLink {
        url: origin.to_owned(),
        reason: e.to_string(),
    })?;
    base.join(link.trim()).map_err(|e| ScraperError::InvalidLink {
        url: link.to_owned(),
        reason: e.to_string(),
    })
}

/// Last non-empty path segment of a category URL, e.g. `ovoshchi-frukty`.
#[must_use]
pub fn category_slug(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default()
        .to_owned()
}
