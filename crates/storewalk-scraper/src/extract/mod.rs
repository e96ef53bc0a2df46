//! Typed projections from rendered DOM state.
//!
//! A query renders an in-page script and names the row type the script's
//! JSON result must deserialize into. [`extract`] runs it and enforces that
//! schema; the helpers below add the per-kind post-processing.

mod queries;
pub mod srcset;

use serde::de::DeserializeOwned;
use storewalk_core::{ProductCardSelectors, ProductRecord};

use crate::error::ScraperError;
use crate::page::PageHandle;

pub use queries::{CategoryLinkQuery, ProductQuery, RawProductCard, StoreLinkQuery};

/// A DOM query whose result is a JSON array of `Row`.
pub trait ExtractionQuery {
    type Row: DeserializeOwned;

    /// Short label for logs and error context.
    fn describe(&self) -> String;

    /// Expression evaluating to an array of rows.
    fn script(&self) -> String;
}

/// Evaluates `query` on the current page.
///
/// # Errors
///
/// Returns [`ScraperError::Page`] if evaluation fails, or
/// [`ScraperError::Deserialize`] if the result does not match the row schema.
pub async fn extract<P, Q>(page: &P, query: &Q) -> Result<Vec<Q::Row>, ScraperError>
where
    P: PageHandle + ?Sized,
    Q: ExtractionQuery + Sync,
{
    let value = page.evaluate(&query.script()).await?;
    serde_json::from_value(value).map_err(|source| ScraperError::Deserialize {
        context: query.describe(),
        source,
    })
}

/// Category links of the current store page, at most `limit` of them.
///
/// Cards without an `href` are dropped before the cap is applied.
///
/// # Errors
///
/// See [`extract`].
pub async fn extract_category_links<P>(
    page: &P,
    selector: &str,
    limit: usize,
) -> Result<Vec<String>, ScraperError>
where
    P: PageHandle + ?Sized,
{
    let rows = extract(page, &CategoryLinkQuery { selector }).await?;
    Ok(cap_links(rows, limit))
}

pub(crate) fn cap_links(rows: Vec<Option<String>>, limit: usize) -> Vec<String> {
    rows.into_iter()
        .flatten()
        .map(|href| href.trim().to_owned())
        .filter(|href| !href.is_empty())
        .take(limit)
        .collect()
}

/// Product records for every card on the current category page.
///
/// # Errors
///
/// See [`extract`].
pub async fn extract_products<P>(
    page: &P,
    selectors: &ProductCardSelectors,
    store_url: &str,
    category: &str,
) -> Result<Vec<ProductRecord>, ScraperError>
where
    P: PageHandle + ?Sized,
{
    let rows = extract(page, &ProductQuery { selectors }).await?;
    Ok(rows
        .into_iter()
        .map(|card| card.into_record(store_url, category))
        .collect())
}
