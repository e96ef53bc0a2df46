//! The `crawl` command: launch the browser, run one traversal, export CSV.
//!
//! Whatever the traversal collected is written out even when the run ends
//! early (fatal error, deadline, Ctrl-C); the command then exits non-zero.

use std::path::Path;

use anyhow::Context;
use storewalk_core::{AppConfig, RunResult, SiteProfile};
use storewalk_scraper::{
    BrowserOptions, ChromeSession, RunSummary, ScraperError, Traversal, TraversalSettings,
};
use tokio_util::sync::CancellationToken;

use crate::sink;

pub(crate) async fn run_crawl(config: &AppConfig, profile: &SiteProfile) -> anyhow::Result<()> {
    let options = BrowserOptions::from_app_config(config);
    let settings = TraversalSettings::from_app_config(config);

    tracing::info!(
        origin = %config.site_origin,
        address = %config.delivery_address,
        output = %config.output_path.display(),
        "starting crawl"
    );
    let session = ChromeSession::launch(&options)
        .await
        .context("failed to start the browser")?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping after the current step");
            interrupt.cancel();
        }
    });

    let mut result = RunResult::new();
    let outcome = Traversal::new(&session, profile, &settings, cancel)
        .run_with_deadline(&mut result)
        .await;

    ctrl_c.abort();
    session.close().await;

    finish(&config.output_path, &result, outcome)
}

/// Writes the collected records, then reports how the run ended.
///
/// The file is written before the outcome is inspected, so a run that failed
/// part-way still leaves its partial results on disk.
fn finish(
    output: &Path,
    result: &RunResult,
    outcome: Result<RunSummary, ScraperError>,
) -> anyhow::Result<()> {
    sink::write_csv_file(output, result.records())?;
    tracing::info!(
        path = %output.display(),
        records = result.len(),
        "wrote products"
    );

    match outcome {
        Ok(summary) => {
            tracing::info!(
                layout = ?summary.layout,
                stores_visited = summary.stores_visited,
                stores_skipped = summary.stores_skipped,
                categories_visited = summary.categories_visited,
                categories_skipped = summary.categories_skipped,
                records = summary.records,
                "crawl complete"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, records = result.len(), "crawl ended early");
            Err(anyhow::Error::new(e).context("crawl ended early; partial results were written"))
        }
    }
}
