use serde::Deserialize;
use storewalk_core::{LayoutSelectors, LayoutVariant, ProductCardSelectors, ProductRecord};

use super::srcset::large_image_from_srcset;
use super::ExtractionQuery;
use crate::page::js_string;

/// Absolute `href` of every store anchor in the resolved landing layout.
#[derive(Debug, Clone, Copy)]
pub struct StoreLinkQuery<'a> {
    pub variant: LayoutVariant,
    pub selectors: &'a LayoutSelectors,
}

impl ExtractionQuery for StoreLinkQuery<'_> {
    type Row = String;

    fn describe(&self) -> String {
        format!("{} store links", self.variant)
    }

    fn script(&self) -> String {
        format!(
            "Array.from(document.querySelectorAll({})).map(a => a.href || '')",
            js_string(&self.selectors.store_links)
        )
    }
}

/// Raw `href` attribute of each category card, as authored (usually a path).
///
/// Cards without the attribute produce `null` rows.
#[derive(Debug, Clone, Copy)]
pub struct CategoryLinkQuery<'a> {
    pub selector: &'a str,
}

impl ExtractionQuery for CategoryLinkQuery<'_> {
    type Row = Option<String>;

    fn describe(&self) -> String {
        "category links".to_owned()
    }

    fn script(&self) -> String {
        format!(
            "Array.from(document.querySelectorAll({})).map(link => link.getAttribute('href'))",
            js_string(self.selector)
        )
    }
}

/// One row per product card on a category page.
#[derive(Debug, Clone, Copy)]
pub struct ProductQuery<'a> {
    pub selectors: &'a ProductCardSelectors,
}

impl ExtractionQuery for ProductQuery<'_> {
    type Row = RawProductCard;

    fn describe(&self) -> String {
        "product cards".to_owned()
    }

    fn script(&self) -> String {
        let s = self.selectors;
        format!(
            r"Array.from(document.querySelectorAll({root})).map(card => {{
    const image = card.querySelector({image});
    return {{
        productUrl: card.querySelector({link})?.href ?? null,
        name: card.querySelector({title})?.textContent ?? null,
        imageUrl: image ? image.src : null,
        srcset: image ? image.srcset : null,
        price: card.querySelector({price})?.textContent ?? null,
        originalPrice: card.querySelector({original_price})?.textContent ?? null,
    }};
}})",
            root = js_string(&s.root),
            image = js_string(&s.image),
            link = js_string(&s.link),
            title = js_string(&s.title),
            price = js_string(&s.price),
            original_price = js_string(&s.original_price),
        )
    }
}

/// A product card as the page reported it. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawProductCard {
    pub product_url: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub srcset: Option<String>,
    pub price: Option<String>,
    pub original_price: Option<String>,
}

impl RawProductCard {
    /// Normalizes into a [`ProductRecord`]: missing fields become `""`, text
    /// is trimmed, and the large image is taken from the `2x` srcset entry.
    #[must_use]
    pub fn into_record(self, store_url: &str, category: &str) -> ProductRecord {
        let large_image_url = self
            .srcset
            .as_deref()
            .map(large_image_from_srcset)
            .unwrap_or_default();

        ProductRecord {
            store_url: store_url.to_owned(),
            category: category.to_owned(),
            product_url: text(self.product_url),
            name: text(self.name),
            image_url: text(self.image_url),
            large_image_url,
            price: text(self.price),
            original_price: text(self.original_price),
        }
    }
}

fn text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_owned()).unwrap_or_default()
}
