mod crawl;
mod sink;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use storewalk_core::{AppConfig, ConfigOverrides, SiteProfile};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "storewalk")]
#[command(about = "Walk a grocery delivery site and export its product cards")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Enter the delivery address, visit every store, and write products to CSV
    Crawl {
        /// Delivery address typed into the landing page
        #[arg(long)]
        address: Option<String>,

        /// Site origin, e.g. https://sbermarket.ru
        #[arg(long)]
        origin: Option<String>,

        /// CSV output path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Show the browser window
        #[arg(long)]
        headful: bool,
    },
    /// Print the effective configuration and site profile
    Config,
}

impl Commands {
    fn overrides(&self) -> ConfigOverrides {
        match self {
            Commands::Crawl {
                address,
                origin,
                output,
                headful,
            } => ConfigOverrides {
                delivery_address: address.clone(),
                site_origin: origin.clone(),
                output_path: output.clone(),
                headful: *headful,
            },
            Commands::Config => ConfigOverrides::default(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = storewalk_core::load_app_config()?;
    let config = storewalk_core::apply_overrides(config, cli.command.overrides())?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let profile = load_profile(&config)?;

    match cli.command {
        Commands::Crawl { .. } => crawl::run_crawl(&config, &profile).await,
        Commands::Config => print_config(&config, &profile),
    }
}

fn load_profile(config: &AppConfig) -> anyhow::Result<SiteProfile> {
    match &config.site_profile_path {
        Some(path) => {
            let profile = storewalk_core::load_site_profile(path)?;
            tracing::info!(path = %path.display(), "loaded site profile");
            Ok(profile)
        }
        None => Ok(SiteProfile::default()),
    }
}

fn print_config(config: &AppConfig, profile: &SiteProfile) -> anyhow::Result<()> {
    println!("env: {}", config.env);
    println!("site_origin: {}", config.site_origin);
    println!("delivery_address: {}", config.delivery_address);
    println!(
        "site_profile: {}",
        config
            .site_profile_path
            .as_ref()
            .map_or_else(|| "<built-in>".to_string(), |p| p.display().to_string())
    );
    println!("output_path: {}", config.output_path.display());
    println!("headless: {}", config.headless);
    println!("window: {}x{}", config.window_width, config.window_height);
    println!(
        "timeouts: run={}s wait={}s layout={}s overlay={}s poll={}ms settle={}ms",
        config.run_timeout_secs,
        config.wait_timeout_secs,
        config.layout_timeout_secs,
        config.overlay_timeout_secs,
        config.poll_interval_ms,
        config.typing_settle_ms
    );
    println!("max_categories_per_store: {}", config.max_categories_per_store);
    println!("---");
    print!("{}", serde_yaml::to_string(profile)?);
    Ok(())
}
