//! Best-effort dismissal of promotional modals that can cover the landing page.

use storewalk_core::{OverlaySpec, OverlayStrategy};
use tokio_util::sync::CancellationToken;

use crate::page::{Condition, PageHandle};
use crate::race::race_conditions;
use crate::wait::{await_condition, WaitOutcome, WaitPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissOutcome {
    Dismissed,
    /// The dismiss control never became visible within the overlay timeout.
    Absent,
    /// The control was visible but the click failed. Not an error.
    ClickFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayReport {
    pub name: String,
    pub outcome: DismissOutcome,
}

/// Waits (bounded) for the overlay's dismiss control and clicks it.
pub async fn try_dismiss<P>(
    page: &P,
    overlay: &OverlaySpec,
    policy: WaitPolicy,
    cancel: &CancellationToken,
) -> DismissOutcome
where
    P: PageHandle + ?Sized,
{
    let condition = Condition::visible(overlay.dismiss_selector.as_str());
    match await_condition(page, &condition, policy, cancel).await {
        WaitOutcome::NotFound => {
            tracing::debug!(overlay = %overlay.name, "overlay not shown");
            DismissOutcome::Absent
        }
        WaitOutcome::Found => click_dismiss(page, overlay).await,
    }
}

async fn click_dismiss<P>(page: &P, overlay: &OverlaySpec) -> DismissOutcome
where
    P: PageHandle + ?Sized,
{
    match page.click(&overlay.dismiss_selector).await {
        Ok(()) => {
            tracing::info!(overlay = %overlay.name, "overlay dismissed");
            DismissOutcome::Dismissed
        }
        Err(e) => {
            tracing::warn!(overlay = %overlay.name, error = %e, "failed to dismiss overlay");
            DismissOutcome::ClickFailed
        }
    }
}

/// Dismisses every overlay in `overlays` that shows up.
///
/// [`OverlayStrategy::Sequential`] gives each overlay its own bounded check,
/// in order. [`OverlayStrategy::Race`] races all overlays not yet handled and
/// clicks whichever appears first, repeating until a round times out; every
/// overlay is then reported exactly once.
pub async fn dismiss_overlays<P>(
    page: &P,
    overlays: &[OverlaySpec],
    strategy: OverlayStrategy,
    policy: WaitPolicy,
    cancel: &CancellationToken,
) -> Vec<OverlayReport>
where
    P: PageHandle + ?Sized,
{
    match strategy {
        OverlayStrategy::Sequential => {
            let mut reports = Vec::with_capacity(overlays.len());
            for overlay in overlays {
                if cancel.is_cancelled() {
                    break;
                }
                let outcome = try_dismiss(page, overlay, policy, cancel).await;
                reports.push(OverlayReport {
                    name: overlay.name.clone(),
                    outcome,
                });
            }
            reports
        }
        OverlayStrategy::Race => race_overlays(page, overlays, policy, cancel).await,
    }
}

async fn race_overlays<P>(
    page: &P,
    overlays: &[OverlaySpec],
    policy: WaitPolicy,
    cancel: &CancellationToken,
) -> Vec<OverlayReport>
where
    P: PageHandle + ?Sized,
{
    let mut pending: Vec<&OverlaySpec> = overlays.iter().collect();
    let mut reports = Vec::with_capacity(overlays.len());

    while !pending.is_empty() {
        let conditions: Vec<Condition> = pending
            .iter()
            .map(|o| Condition::visible(o.dismiss_selector.as_str()))
            .collect();
        match race_conditions(page, &conditions, policy, cancel).await {
            Ok(winner) => {
                let overlay = pending.remove(winner.index);
                let outcome = click_dismiss(page, overlay).await;
                reports.push(OverlayReport {
                    name: overlay.name.clone(),
                    outcome,
                });
            }
            Err(e) => {
                tracing::debug!(pending = pending.len(), error = %e, "no further overlays");
                break;
            }
        }
    }

    reports.extend(pending.into_iter().map(|overlay| OverlayReport {
        name: overlay.name.clone(),
        outcome: DismissOutcome::Absent,
    }));
    reports
}
