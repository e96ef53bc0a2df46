use std::path::PathBuf;
use std::time::Duration;

/// Upper bound on category pages visited per store.
///
/// Sampling cap carried over from the first version of the crawler; override
/// with `STOREWALK_MAX_CATEGORIES_PER_STORE`.
pub const DEFAULT_MAX_CATEGORIES_PER_STORE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Scheme + host of the retail site, e.g. `https://sbermarket.ru`.
    pub site_origin: String,
    /// Delivery address typed into the landing page to select stores.
    pub delivery_address: String,
    /// Optional YAML site profile; `None` uses the built-in selectors.
    pub site_profile_path: Option<PathBuf>,
    pub output_path: PathBuf,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub run_timeout_secs: u64,
    pub wait_timeout_secs: u64,
    pub layout_timeout_secs: u64,
    pub overlay_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub typing_settle_ms: u64,
    pub max_categories_per_store: usize,
}

impl AppConfig {
    /// Deadline for the whole traversal.
    #[must_use]
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    /// Deadline for mandatory element waits (address input, store catalog).
    #[must_use]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    #[must_use]
    pub fn layout_timeout(&self) -> Duration {
        Duration::from_secs(self.layout_timeout_secs)
    }

    #[must_use]
    pub fn overlay_timeout(&self) -> Duration {
        Duration::from_secs(self.overlay_timeout_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn typing_settle(&self) -> Duration {
        Duration::from_millis(self.typing_settle_ms)
    }
}
