//! The traversal controller: landing page → stores → categories → products.
//!
//! A run moves through [`RunState`]s in order and logs every transition with
//! a `state` field. Setup failures, layout resolution and store discovery end
//! the run; anything that goes wrong inside one store or one category is
//! logged and skipped. Records are appended to a caller-owned [`RunResult`]
//! as soon as each category is extracted, so a run that is cancelled or hits
//! its deadline still leaves everything collected so far.

use std::future::Future;
use std::time::Duration;

use storewalk_core::{AppConfig, LayoutVariant, RunResult, SiteProfile};
use tokio_util::sync::CancellationToken;

use crate::error::{ScraperError, Step};
use crate::extract::{extract, extract_category_links, extract_products, StoreLinkQuery};
use crate::links::{category_slug, resolve_link, StoreReference};
use crate::overlay::{dismiss_overlays, DismissOutcome};
use crate::page::{Condition, Key, PageHandle, Permission};
use crate::race::{race_conditions, RaceError};
use crate::wait::{await_condition, require_condition, WaitOutcome, WaitPolicy};

/// Tunables for one traversal, usually derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct TraversalSettings {
    pub origin: String,
    pub delivery_address: String,
    /// Applied before the first navigation when set.
    pub viewport: Option<(u32, u32)>,
    /// Mandatory waits: address input and store catalog.
    pub wait: WaitPolicy,
    pub layout: WaitPolicy,
    pub overlay: WaitPolicy,
    pub typing_settle: Duration,
    pub max_categories_per_store: usize,
    pub run_timeout: Duration,
}

impl TraversalSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let poll = config.poll_interval();
        Self {
            origin: config.site_origin.clone(),
            delivery_address: config.delivery_address.clone(),
            viewport: Some((config.window_width, config.window_height)),
            wait: WaitPolicy::new(config.wait_timeout(), poll),
            layout: WaitPolicy::new(config.layout_timeout(), poll),
            overlay: WaitPolicy::new(config.overlay_timeout(), poll),
            typing_settle: config.typing_settle(),
            max_categories_per_store: config.max_categories_per_store,
            run_timeout: config.run_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Navigated,
    AddressEntered,
    LayoutResolved,
    StoresDiscovered,
    CatalogLoaded,
    CategoriesDiscovered,
    ProductsExtracted,
    Done,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunState::Init => "init",
            RunState::Navigated => "navigated",
            RunState::AddressEntered => "address_entered",
            RunState::LayoutResolved => "layout_resolved",
            RunState::StoresDiscovered => "stores_discovered",
            RunState::CatalogLoaded => "catalog_loaded",
            RunState::CategoriesDiscovered => "categories_discovered",
            RunState::ProductsExtracted => "products_extracted",
            RunState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Counters for a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub layout: Option<LayoutVariant>,
    pub overlays_dismissed: usize,
    pub stores_discovered: usize,
    pub stores_visited: usize,
    pub stores_skipped: usize,
    pub categories_visited: usize,
    pub categories_skipped: usize,
    pub records: usize,
}

/// Drives one browser tab through the whole site.
pub struct Traversal<'a, P: ?Sized> {
    page: &'a P,
    profile: &'a SiteProfile,
    settings: &'a TraversalSettings,
    cancel: CancellationToken,
}

impl<'a, P> Traversal<'a, P>
where
    P: PageHandle + ?Sized,
{
    #[must_use]
    pub fn new(
        page: &'a P,
        profile: &'a SiteProfile,
        settings: &'a TraversalSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            page,
            profile,
            settings,
            cancel,
        }
    }

    /// [`Traversal::run`] bounded by `settings.run_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::RunTimeout`] when the deadline passes first;
    /// otherwise whatever [`Traversal::run`] returns. `result` keeps the
    /// records collected before the deadline.
    pub async fn run_with_deadline(
        &self,
        result: &mut RunResult,
    ) -> Result<RunSummary, ScraperError> {
        let limit = self.settings.run_timeout;
        if let Ok(outcome) = tokio::time::timeout(limit, self.run(result)).await {
            outcome
        } else {
            tracing::error!(
                limit_secs = limit.as_secs(),
                records = result.len(),
                "run deadline exceeded"
            );
            Err(ScraperError::RunTimeout {
                limit_secs: limit.as_secs(),
            })
        }
    }

    /// Runs the traversal to completion, appending records to `result`.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`ScraperError`] (see [`ScraperError::is_fatal`]).
    /// Per-store and per-category failures are logged and skipped.
    pub async fn run(&self, result: &mut RunResult) -> Result<RunSummary, ScraperError> {
        let mut summary = RunSummary::default();
        self.transition(RunState::Init);

        self.open_site().await?;
        self.transition(RunState::Navigated);

        summary.overlays_dismissed = self.enter_address().await?;
        self.transition(RunState::AddressEntered);

        let variant = self.resolve_layout().await?;
        summary.layout = Some(variant);
        tracing::info!(state = %RunState::LayoutResolved, layout = %variant, "state transition");

        let links = self.discover_stores(variant).await?;
        summary.stores_discovered = links.len();
        tracing::info!(
            state = %RunState::StoresDiscovered,
            stores = links.len(),
            "state transition"
        );

        if links.is_empty() {
            tracing::warn!(layout = %variant, "no stores deliver to this address");
        }

        for link in &links {
            self.checkpoint()?;
            match self.visit_store(link, result, &mut summary).await {
                Ok(()) => summary.stores_visited += 1,
                Err(e) if e.is_cancellation() => return Err(e),
                Err(e) => {
                    tracing::warn!(link = %link, error = %e, "skipping store");
                    summary.stores_skipped += 1;
                }
            }
        }

        tracing::info!(
            state = %RunState::Done,
            stores_visited = summary.stores_visited,
            stores_skipped = summary.stores_skipped,
            categories_visited = summary.categories_visited,
            categories_skipped = summary.categories_skipped,
            records = summary.records,
            "state transition"
        );
        Ok(summary)
    }

    /// Viewport, geolocation grant, and the first navigation.
    async fn open_site(&self) -> Result<(), ScraperError> {
        let origin = self.settings.origin.as_str();

        if let Some((width, height)) = self.settings.viewport {
            if let Err(e) = self.page.set_viewport(width, height).await {
                tracing::warn!(width, height, error = %e, "failed to set viewport");
            }
        }

        self.page
            .grant_permission(Permission::Geolocation, origin)
            .await
            .map_err(|source| ScraperError::FatalSetup {
                stage: "grant geolocation permission",
                source,
            })?;

        tracing::info!(url = %origin, "navigating to site root");
        self.cancellable(async {
            self.page
                .navigate(origin)
                .await
                .map_err(|source| ScraperError::FatalSetup {
                    stage: "navigate to site root",
                    source,
                })
        })
        .await
    }

    /// Clears overlays and submits the delivery address. Only cancellation
    /// is an error here; everything else is logged and the run moves on to
    /// the layout race. Returns the number of overlays dismissed.
    async fn enter_address(&self) -> Result<usize, ScraperError> {
        let reports = dismiss_overlays(
            self.page,
            &self.profile.overlays,
            self.profile.overlay_strategy,
            self.settings.overlay,
            &self.cancel,
        )
        .await;
        self.checkpoint()?;
        let dismissed = reports
            .iter()
            .filter(|r| r.outcome == DismissOutcome::Dismissed)
            .count();

        let input = Condition::visible(self.profile.address_input.as_str());
        if await_condition(self.page, &input, self.settings.wait, &self.cancel).await
            == WaitOutcome::NotFound
        {
            self.checkpoint()?;
            tracing::error!(selector = %input.selector, "address input did not appear");
            return Ok(dismissed);
        }

        if let Err(e) = self
            .page
            .type_text(&self.profile.address_input, &self.settings.delivery_address)
            .await
        {
            tracing::error!(error = %e, "failed to type delivery address");
            return Ok(dismissed);
        }

        self.pause(self.settings.typing_settle).await?;

        if let Err(e) = self.page.send_key(Key::Enter).await {
            tracing::error!(error = %e, "failed to submit delivery address");
        }
        Ok(dismissed)
    }

    async fn resolve_layout(&self) -> Result<LayoutVariant, ScraperError> {
        let conditions: Vec<Condition> = LayoutVariant::ALL
            .iter()
            .map(|&v| Condition::present(self.profile.layout(v).root.as_str()))
            .collect();

        match race_conditions(self.page, &conditions, self.settings.layout, &self.cancel).await {
            Ok(winner) => Ok(LayoutVariant::ALL[winner.index]),
            Err(RaceError::Cancelled) => Err(ScraperError::Cancelled),
            Err(e) => {
                tracing::error!(error = %e, "neither landing layout rendered");
                Err(ScraperError::LayoutResolution(e))
            }
        }
    }

    async fn discover_stores(&self, variant: LayoutVariant) -> Result<Vec<String>, ScraperError> {
        let query = StoreLinkQuery {
            variant,
            selectors: self.profile.layout(variant),
        };
        self.cancellable(extract(self.page, &query))
            .await
            .map_err(|e| {
                if e.is_cancellation() {
                    e
                } else {
                    ScraperError::StoreDiscovery(Box::new(e))
                }
            })
    }

    async fn visit_store(
        &self,
        link: &str,
        result: &mut RunResult,
        summary: &mut RunSummary,
    ) -> Result<(), ScraperError> {
        let origin = self.settings.origin.as_str();
        let store = StoreReference::from_link(origin, link)
            .map_err(|e| ScraperError::transient(Step::StoreLink, link, e))?;
        let store_id = store.store_id.as_str();
        let store_url = self.profile.store_url(origin, store_id);

        tracing::info!(store_id, url = %store_url, "visiting store");
        self.cancellable(async {
            self.page
                .navigate(&store_url)
                .await
                .map_err(ScraperError::from)
        })
        .await
        .map_err(|e| ScraperError::transient(Step::StoreNavigate, &store_url, e))?;

        let catalog = Condition::visible(self.profile.catalog.container.as_str());
        require_condition(self.page, &catalog, self.settings.wait, &self.cancel)
            .await
            .map_err(|e| ScraperError::transient(Step::CatalogWait, &store_url, e))?;
        tracing::info!(state = %RunState::CatalogLoaded, store_id, "state transition");

        let categories = self
            .cancellable(extract_category_links(
                self.page,
                &self.profile.catalog.category_links,
                self.settings.max_categories_per_store,
            ))
            .await
            .map_err(|e| ScraperError::transient(Step::CategoryLinks, &store_url, e))?;
        tracing::info!(
            state = %RunState::CategoriesDiscovered,
            store_id,
            categories = categories.len(),
            "state transition"
        );

        for href in &categories {
            self.checkpoint()?;
            match self.visit_category(&store_url, href).await {
                Ok(records) => {
                    summary.categories_visited += 1;
                    summary.records += records.len();
                    result.extend(records);
                }
                Err(e) if e.is_cancellation() => return Err(e),
                Err(e) => {
                    tracing::warn!(store_id, category = %href, error = %e, "skipping category");
                    summary.categories_skipped += 1;
                }
            }
        }
        Ok(())
    }

    async fn visit_category(
        &self,
        store_url: &str,
        href: &str,
    ) -> Result<Vec<storewalk_core::ProductRecord>, ScraperError> {
        let url = resolve_link(&self.settings.origin, href)
            .map_err(|e| ScraperError::transient(Step::CategoryNavigate, href, e))?;
        let category = category_slug(&url);

        self.cancellable(async {
            self.page
                .navigate(url.as_str())
                .await
                .map_err(ScraperError::from)
        })
        .await
        .map_err(|e| ScraperError::transient(Step::CategoryNavigate, url.as_str(), e))?;

        let records = self
            .cancellable(extract_products(
                self.page,
                &self.profile.product_card,
                store_url,
                &category,
            ))
            .await
            .map_err(|e| ScraperError::transient(Step::ProductExtract, url.as_str(), e))?;

        tracing::info!(
            state = %RunState::ProductsExtracted,
            category = %category,
            products = records.len(),
            "state transition"
        );
        Ok(records)
    }

    fn transition(&self, state: RunState) {
        tracing::info!(state = %state, "state transition");
    }

    fn checkpoint(&self) -> Result<(), ScraperError> {
        if self.cancel.is_cancelled() {
            Err(ScraperError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn pause(&self, duration: Duration) -> Result<(), ScraperError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ScraperError::Cancelled),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Abandons `work` as soon as the run token fires.
    async fn cancellable<T, F>(&self, work: F) -> Result<T, ScraperError>
    where
        F: Future<Output = Result<T, ScraperError>>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ScraperError::Cancelled),
            outcome = work => outcome,
        }
    }
}
