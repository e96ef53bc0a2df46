use serde::{Deserialize, Serialize};

/// One product card extracted from a category page.
///
/// Every field is plain text and defaults to `""` when the page did not
/// render the corresponding node. Duplicates across categories are expected
/// and kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Canonical store URL the category was reached from, built from the
    /// profile's store URL template.
    ///
    /// This is not the address of the category page itself; that page is
    /// identified by [`ProductRecord::category`].
    pub store_url: String,
    /// Category slug, e.g. `"ovoshchi-frukty"`.
    pub category: String,
    pub product_url: String,
    pub name: String,
    pub image_url: String,
    /// The `2x` density entry of the card image's `srcset`.
    pub large_image_url: String,
    /// Price text exactly as rendered, e.g. `"89,99 ₽"`.
    pub price: String,
    /// Pre-discount price text; empty when the product is not on sale.
    pub original_price: String,
}

/// Ordered, append-only collection of the records produced by one traversal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunResult {
    records: Vec<ProductRecord>,
}

impl RunResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a batch in extraction order.
    pub fn extend(&mut self, batch: impl IntoIterator<Item = ProductRecord>) {
        self.records.extend(batch);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    /// Consumes the result for hand-off to a sink.
    #[must_use]
    pub fn into_records(self) -> Vec<ProductRecord> {
        self.records
    }
}
