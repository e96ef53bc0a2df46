//! Site profile: every selector and URL shape the traversal depends on.
//!
//! The built-in [`SiteProfile::default`] targets the sbermarket landing,
//! store and category pages. A YAML file with the same shape can replace it
//! (see `config/site.yaml`) when the storefront's generated class names
//! rotate.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Placeholder in [`SiteProfile::store_url_template`] replaced by the site origin.
const ORIGIN_PLACEHOLDER: &str = "{origin}";
/// Placeholder in [`SiteProfile::store_url_template`] replaced by the store id.
const STORE_ID_PLACEHOLDER: &str = "{store_id}";

/// Mutually exclusive landing-page layouts listing the stores that deliver to
/// the entered address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutVariant {
    Carousel,
    Grid,
}

impl LayoutVariant {
    /// All variants in the order their conditions are handed to the race.
    pub const ALL: [LayoutVariant; 2] = [LayoutVariant::Carousel, LayoutVariant::Grid];
}

impl std::fmt::Display for LayoutVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutVariant::Carousel => write!(f, "carousel"),
            LayoutVariant::Grid => write!(f, "grid"),
        }
    }
}

/// How the known overlays are probed before the address is entered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayStrategy {
    /// One bounded check per overlay, in profile order.
    #[default]
    Sequential,
    /// Race all pending overlays and dismiss whichever shows up, until none do.
    Race,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySpec {
    /// Short label used in logs.
    pub name: String,
    /// The close button of the modal; clicking it dismisses the overlay.
    pub dismiss_selector: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSelectors {
    /// Element whose presence identifies this layout.
    pub root: String,
    /// Anchors linking to individual stores in this layout.
    pub store_links: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layouts {
    pub carousel: LayoutSelectors,
    pub grid: LayoutSelectors,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSelectors {
    /// Category grid on a store page; waited on before reading links.
    pub container: String,
    /// Category cards whose `href` attribute is the category path.
    pub category_links: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCardSelectors {
    /// One element per product on a category page.
    pub root: String,
    /// The following are resolved relative to `root`.
    pub link: String,
    pub title: String,
    pub image: String,
    pub price: String,
    pub original_price: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Delivery address input on the landing page.
    pub address_input: String,
    #[serde(default)]
    pub overlay_strategy: OverlayStrategy,
    #[serde(default)]
    pub overlays: Vec<OverlaySpec>,
    pub layouts: Layouts,
    /// Canonical store page, e.g. `"{origin}/stores/{store_id}"`.
    pub store_url_template: String,
    pub catalog: CatalogSelectors,
    pub product_card: ProductCardSelectors,
}

impl SiteProfile {
    #[must_use]
    pub fn layout(&self, variant: LayoutVariant) -> &LayoutSelectors {
        match variant {
            LayoutVariant::Carousel => &self.layouts.carousel,
            LayoutVariant::Grid => &self.layouts.grid,
        }
    }

    /// Renders [`Self::store_url_template`] for one store.
    #[must_use]
    pub fn store_url(&self, origin: &str, store_id: &str) -> String {
        self.store_url_template
            .replace(ORIGIN_PLACEHOLDER, origin.trim_end_matches('/'))
            .replace(STORE_ID_PLACEHOLDER, store_id)
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            address_input: "#by_courier > div.MainBanner_root__7uO0e.MainBanner_background__IiBe2.Address_banner__0VXxz.HomeLanding_banner__h1Y1D > div > div.Address_inputWrapper__g_O6L > div > div > input".to_owned(),
            overlay_strategy: OverlayStrategy::Sequential,
            overlays: vec![
                OverlaySpec {
                    name: "first-promo".to_owned(),
                    dismiss_selector: "body > div.Modal_root__txmvv.FirstPromoModal_modal__NHjaj > div > div:nth-child(2) > header > button".to_owned(),
                },
                OverlaySpec {
                    name: "frame-modal".to_owned(),
                    dismiss_selector: "#__next > div.styles_framesGroup__iZc0Z > div.styles_frame__laheH > div > div > div:nth-child(2) > div > div > div.ModalWrapper_right__NxZN0 > button".to_owned(),
                },
            ],
            layouts: Layouts {
                carousel: LayoutSelectors {
                    root: "#Carousel2Container".to_owned(),
                    store_links: "a.StoreCompact_root__qgCI1".to_owned(),
                },
                grid: LayoutSelectors {
                    root: "#__next > div.body > div > div.HomeLanding_pageWrapper__3mybA.HomeLanding_hasNewHeader__M20U5 > div > div.Stores_root__Qsjv1.HomeLanding_section__Z04e1.HomeLanding_sectionRteMode__2CudG > div".to_owned(),
                    store_links: "a.Stores_storeWrapper__Q6wfJ".to_owned(),
                },
            },
            store_url_template: "{origin}/stores/{store_id}?referrer=landing_retailer_list"
                .to_owned(),
            catalog: CatalogSelectors {
                container: "#__next > div.body > div:nth-child(4) > section:nth-child(2) > div > ul > div.CategoryGrid_root__6xVIs".to_owned(),
                category_links: ".CategoryGridItem_root__jXxOA .CategoryCard_root__LiY3P"
                    .to_owned(),
            },
            product_card: ProductCardSelectors {
                root: ".ProductCard_root__K6IZK".to_owned(),
                link: ".ProductCardLink_root__69qxV".to_owned(),
                title: ".ProductCard_title__iNsaD".to_owned(),
                image: ".ProductCard_image__3jwTC".to_owned(),
                price: ".ProductCardPrice_price__Kv7Q7".to_owned(),
                original_price: ".ProductCardPrice_originalPrice__z36Di".to_owned(),
            },
        }
    }
}

/// Load and validate a site profile from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_site_profile(path: &Path) -> Result<SiteProfile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProfileFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let profile: SiteProfile = serde_yaml::from_str(&content)?;
    validate_profile(&profile)?;

    Ok(profile)
}

fn validate_profile(profile: &SiteProfile) -> Result<(), ConfigError> {
    let required = [
        ("address_input", &profile.address_input),
        ("layouts.carousel.root", &profile.layouts.carousel.root),
        (
            "layouts.carousel.store_links",
            &profile.layouts.carousel.store_links,
        ),
        ("layouts.grid.root", &profile.layouts.grid.root),
        ("layouts.grid.store_links", &profile.layouts.grid.store_links),
        ("catalog.container", &profile.catalog.container),
        ("catalog.category_links", &profile.catalog.category_links),
        ("product_card.root", &profile.product_card.root),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{field} must be non-empty")));
        }
    }

    if profile.layouts.carousel.root == profile.layouts.grid.root {
        return Err(ConfigError::Validation(
            "carousel and grid layouts must have distinct root selectors".to_string(),
        ));
    }

    if !profile.store_url_template.contains(STORE_ID_PLACEHOLDER) {
        return Err(ConfigError::Validation(format!(
            "store_url_template must contain {STORE_ID_PLACEHOLDER}"
        )));
    }

    let mut seen = HashSet::new();
    for overlay in &profile.overlays {
        if overlay.dismiss_selector.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "overlay '{}' has an empty dismiss_selector",
                overlay.name
            )));
        }
        if !seen.insert(overlay.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate overlay name: '{}'",
                overlay.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_valid() {
        assert!(validate_profile(&SiteProfile::default()).is_ok());
    }

    #[test]
    fn layout_selects_matching_selectors() {
        let profile = SiteProfile::default();
        assert_eq!(
            profile.layout(LayoutVariant::Carousel).root,
            "#Carousel2Container"
        );
        assert_eq!(
            profile.layout(LayoutVariant::Grid).store_links,
            "a.Stores_storeWrapper__Q6wfJ"
        );
    }

    #[test]
    fn store_url_renders_template() {
        let profile = SiteProfile::default();
        assert_eq!(
            profile.store_url("https://sbermarket.ru/", "177"),
            "https://sbermarket.ru/stores/177?referrer=landing_retailer_list"
        );
    }

    #[test]
    fn validate_rejects_template_without_store_id() {
        let mut profile = SiteProfile::default();
        profile.store_url_template = "{origin}/stores".to_owned();
        let err = validate_profile(&profile).unwrap_err();
        assert!(err.to_string().contains("{store_id}"));
    }

    #[test]
    fn validate_rejects_empty_selector() {
        let mut profile = SiteProfile::default();
        profile.catalog.container = "  ".to_owned();
        let err = validate_profile(&profile).unwrap_err();
        assert!(err.to_string().contains("catalog.container"));
    }

    #[test]
    fn validate_rejects_identical_layout_roots() {
        let mut profile = SiteProfile::default();
        profile.layouts.grid.root = profile.layouts.carousel.root.clone();
        let err = validate_profile(&profile).unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }

    #[test]
    fn validate_rejects_duplicate_overlay_name() {
        let mut profile = SiteProfile::default();
        let first = profile.overlays[0].clone();
        profile.overlays.push(OverlaySpec {
            name: first.name.to_uppercase(),
            dismiss_selector: "#close".to_owned(),
        });
        let err = validate_profile(&profile).unwrap_err();
        assert!(err.to_string().contains("duplicate overlay name"));
    }

    #[test]
    fn yaml_without_overlays_defaults_to_sequential_and_empty() {
        let yaml = r##"
address_input: "#address"
layouts:
  carousel: { root: "#carousel", store_links: "a.store" }
  grid: { root: "#grid", store_links: "a.tile" }
store_url_template: "{origin}/shop/{store_id}"
catalog: { container: "#catalog", category_links: "a.category" }
product_card:
  root: ".card"
  link: "a"
  title: ".title"
  image: "img"
  price: ".price"
  original_price: ".old-price"
"##;
        let profile: SiteProfile = serde_yaml::from_str(yaml).unwrap();
        assert!(profile.overlays.is_empty());
        assert_eq!(profile.overlay_strategy, OverlayStrategy::Sequential);
        assert!(validate_profile(&profile).is_ok());
        assert_eq!(
            profile.store_url("http://localhost:9000", "42"),
            "http://localhost:9000/shop/42"
        );
    }

    #[test]
    fn yaml_race_strategy_parses() {
        let mut profile = SiteProfile::default();
        profile.overlay_strategy = OverlayStrategy::Race;
        let yaml = serde_yaml::to_string(&profile).unwrap();
        assert!(yaml.contains("overlay_strategy: race"));
        let back: SiteProfile = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.overlay_strategy, OverlayStrategy::Race);
    }

    #[test]
    fn load_site_profile_from_repo_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("site.yaml");
        assert!(path.exists(), "site.yaml missing at {path:?}");
        let result = load_site_profile(&path);
        assert!(result.is_ok(), "failed to load site.yaml: {result:?}");
        assert_eq!(result.unwrap(), SiteProfile::default());
    }

    #[test]
    fn load_site_profile_reports_missing_file() {
        let err = load_site_profile(Path::new("/nonexistent/site.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileFileIo { .. }));
    }

    #[test]
    fn layout_variant_display() {
        assert_eq!(LayoutVariant::Carousel.to_string(), "carousel");
        assert_eq!(LayoutVariant::Grid.to_string(), "grid");
    }
}
