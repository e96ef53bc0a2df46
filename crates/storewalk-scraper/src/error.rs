use thiserror::Error;

use crate::race::RaceError;

/// Failures reported by a [`crate::PageHandle`] implementation.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("no element matches selector \"{selector}\"")]
    ElementNotFound { selector: String },

    #[error("script evaluation failed: {0}")]
    Evaluate(String),

    #[error("browser protocol error: {0}")]
    Protocol(String),
}

/// The unit of per-store or per-category work a [`ScraperError::TransientStep`]
/// was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    StoreLink,
    StoreNavigate,
    CatalogWait,
    CategoryLinks,
    CategoryNavigate,
    ProductExtract,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::StoreLink => write!(f, "store link parsing"),
            Step::StoreNavigate => write!(f, "store navigation"),
            Step::CatalogWait => write!(f, "catalog wait"),
            Step::CategoryLinks => write!(f, "category link extraction"),
            Step::CategoryNavigate => write!(f, "category navigation"),
            Step::ProductExtract => write!(f, "product extraction"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("setup failed while trying to {stage}: {source}")]
    FatalSetup {
        stage: &'static str,
        #[source]
        source: PageError,
    },

    #[error("could not resolve the landing page layout: {0}")]
    LayoutResolution(#[source] RaceError),

    #[error("store discovery failed: {0}")]
    StoreDiscovery(#[source] Box<ScraperError>),

    #[error("{step} failed for {target}: {source}")]
    TransientStep {
        step: Step,
        target: String,
        #[source]
        source: Box<ScraperError>,
    },

    #[error("page error: {0}")]
    Page(#[from] PageError),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("timed out after {waited_ms}ms waiting for \"{selector}\"")]
    WaitTimeout { selector: String, waited_ms: u128 },

    #[error("invalid link \"{url}\": {reason}")]
    InvalidLink { url: String, reason: String },

    #[error("run cancelled")]
    Cancelled,

    #[error("run exceeded its {limit_secs}s deadline")]
    RunTimeout { limit_secs: u64 },

    #[error("failed to launch browser: {0}")]
    Launch(String),
}

impl ScraperError {
    /// Wraps a per-store or per-category failure. Cancellation passes through
    /// unchanged so it is never swallowed by a skip-and-continue loop.
    pub(crate) fn transient(step: Step, target: &str, source: ScraperError) -> Self {
        if source.is_cancellation() {
            return source;
        }
        ScraperError::TransientStep {
            step,
            target: target.to_owned(),
            source: Box::new(source),
        }
    }

    /// Returns `true` if the run stopped because its token fired or its
    /// deadline passed.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            ScraperError::Cancelled | ScraperError::RunTimeout { .. }
        )
    }

    /// Returns `true` if this error terminates the whole run.
    ///
    /// Fatal:
    /// - [`ScraperError::FatalSetup`]: permission grant or first navigation failed.
    /// - [`ScraperError::LayoutResolution`]: neither layout rendered in time.
    /// - [`ScraperError::StoreDiscovery`]: the store list could not be read.
    /// - [`ScraperError::Cancelled`], [`ScraperError::RunTimeout`], [`ScraperError::Launch`].
    ///
    /// Everything else is confined to the store or category that raised it.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScraperError::FatalSetup { .. }
                | ScraperError::LayoutResolution(_)
                | ScraperError::StoreDiscovery(_)
                | ScraperError::Cancelled
                | ScraperError::RunTimeout { .. }
                | ScraperError::Launch(_)
        )
    }
}
