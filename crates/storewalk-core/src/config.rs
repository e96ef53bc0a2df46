use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment, DEFAULT_MAX_CATEGORIES_PER_STORE};
use crate::ConfigError;

/// Origin crawled when `STOREWALK_SITE_ORIGIN` is unset.
const DEFAULT_SITE_ORIGIN: &str = "https://sbermarket.ru";

/// Address used when `STOREWALK_DELIVERY_ADDRESS` is unset. Matches the
/// built-in site profile.
const DEFAULT_DELIVERY_ADDRESS: &str = "2-я Владимирская улица, 26к1";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it from a
/// `HashMap` without `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("STOREWALK_ENV", "development"))?;
    let log_level = or_default("STOREWALK_LOG_LEVEL", "info");

    let site_origin = parse_origin(&or_default("STOREWALK_SITE_ORIGIN", DEFAULT_SITE_ORIGIN))
        .map_err(|reason| invalid("STOREWALK_SITE_ORIGIN", reason))?;

    let delivery_address = or_default("STOREWALK_DELIVERY_ADDRESS", DEFAULT_DELIVERY_ADDRESS);
    if delivery_address.trim().is_empty() {
        return Err(invalid(
            "STOREWALK_DELIVERY_ADDRESS",
            "must not be blank".to_string(),
        ));
    }

    let site_profile_path = lookup("STOREWALK_SITE_PROFILE_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let output_path = PathBuf::from(or_default("STOREWALK_OUTPUT_PATH", "products.csv"));

    let headless = parse_bool(&or_default("STOREWALK_HEADLESS", "true"))
        .map_err(|reason| invalid("STOREWALK_HEADLESS", reason))?;
    let window_width = parse_u32("STOREWALK_WINDOW_WIDTH", "1920")?;
    let window_height = parse_u32("STOREWALK_WINDOW_HEIGHT", "1080")?;

    let run_timeout_secs = parse_u64("STOREWALK_RUN_TIMEOUT_SECS", "360")?;
    let wait_timeout_secs = parse_u64("STOREWALK_WAIT_TIMEOUT_SECS", "30")?;
    let layout_timeout_secs = parse_u64("STOREWALK_LAYOUT_TIMEOUT_SECS", "30")?;
    let overlay_timeout_secs = parse_u64("STOREWALK_OVERLAY_TIMEOUT_SECS", "5")?;
    let poll_interval_ms = parse_u64("STOREWALK_POLL_INTERVAL_MS", "100")?;
    let typing_settle_ms = parse_u64("STOREWALK_TYPING_SETTLE_MS", "2000")?;

    let max_categories_per_store = parse_usize(
        "STOREWALK_MAX_CATEGORIES_PER_STORE",
        &DEFAULT_MAX_CATEGORIES_PER_STORE.to_string(),
    )?;

    if run_timeout_secs == 0 {
        return Err(invalid(
            "STOREWALK_RUN_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    if poll_interval_ms == 0 {
        return Err(invalid(
            "STOREWALK_POLL_INTERVAL_MS",
            "must be greater than zero".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        log_level,
        site_origin,
        delivery_address,
        site_profile_path,
        output_path,
        headless,
        window_width,
        window_height,
        run_timeout_secs,
        wait_timeout_secs,
        layout_timeout_secs,
        overlay_timeout_secs,
        poll_interval_ms,
        typing_settle_ms,
        max_categories_per_store,
    })
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub delivery_address: Option<String>,
    pub site_origin: Option<String>,
    pub output_path: Option<PathBuf>,
    pub headful: bool,
}

/// Apply command-line overrides on top of an env-derived config, with the
/// same validation the environment gets.
///
/// # Errors
///
/// Returns `ConfigError::InvalidOverride` for a blank address or an origin
/// that is not an http(s) URL with a host.
pub fn apply_overrides(
    mut config: AppConfig,
    overrides: ConfigOverrides,
) -> Result<AppConfig, ConfigError> {
    if let Some(address) = overrides.delivery_address {
        if address.trim().is_empty() {
            return Err(ConfigError::InvalidOverride {
                flag: "--address",
                reason: "must not be blank".to_string(),
            });
        }
        config.delivery_address = address;
    }
    if let Some(origin) = overrides.site_origin {
        config.site_origin = parse_origin(&origin)
            .map_err(|reason| ConfigError::InvalidOverride {
                flag: "--origin",
                reason,
            })?;
    }
    if let Some(path) = overrides.output_path {
        config.output_path = path;
    }
    if overrides.headful {
        config.headless = false;
    }
    Ok(config)
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "STOREWALK_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

/// Accepts `true/false`, `1/0`, `yes/no` (case-insensitive).
fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(format!("expected a boolean, got '{other}'")),
    }
}

/// Normalizes the configured origin to `scheme://host[:port]`, dropping any
/// path so relative category links resolve against the site root.
fn parse_origin(raw: &str) -> Result<String, String> {
    let url = url::Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("origin has no host".to_string());
    }
    Ok(url.origin().ascii_serialization())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
