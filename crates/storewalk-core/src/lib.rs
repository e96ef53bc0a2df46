pub mod app_config;
pub mod config;
pub mod products;
pub mod site;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, DEFAULT_MAX_CATEGORIES_PER_STORE};
pub use config::{apply_overrides, load_app_config, load_app_config_from_env, ConfigOverrides};
pub use products::{ProductRecord, RunResult};
pub use site::{
    load_site_profile, CatalogSelectors, LayoutSelectors, LayoutVariant, Layouts, OverlaySpec,
    OverlayStrategy, ProductCardSelectors, SiteProfile,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid value for {flag}: {reason}")]
    InvalidOverride { flag: &'static str, reason: String },

    #[error("failed to read site profile at {path}: {source}")]
    ProfileFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse site profile: {0}")]
    ProfileFileParse(#[from] serde_yaml::Error),

    #[error("site profile validation failed: {0}")]
    Validation(String),
}
