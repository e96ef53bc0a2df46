pub mod browser;
pub mod error;
pub mod extract;
pub mod links;
pub mod overlay;
pub mod page;
pub mod race;
pub mod traversal;
pub mod wait;

pub use browser::{BrowserOptions, ChromeSession};
pub use error::{PageError, ScraperError, Step};
pub use extract::{
    extract, extract_category_links, extract_products, CategoryLinkQuery, ExtractionQuery,
    ProductQuery, RawProductCard, StoreLinkQuery,
};
pub use links::{category_slug, resolve_link, StoreReference};
pub use overlay::{dismiss_overlays, try_dismiss, DismissOutcome, OverlayReport};
pub use page::{Condition, ElementState, Key, PageHandle, Permission};
pub use race::{race_conditions, RaceError, RaceWinner};
pub use traversal::{RunState, RunSummary, Traversal, TraversalSettings};
pub use wait::{await_condition, require_condition, WaitOutcome, WaitPolicy};
