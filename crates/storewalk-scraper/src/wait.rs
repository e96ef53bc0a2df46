//! Bounded polling wait on a single [`Condition`].

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;
use crate::page::{Condition, PageHandle};

/// Upper bound and polling cadence for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitPolicy {
    #[must_use]
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Found,
    NotFound,
}

impl WaitOutcome {
    #[must_use]
    pub fn is_found(self) -> bool {
        matches!(self, WaitOutcome::Found)
    }
}

/// Polls `condition` every `policy.poll_interval` until it holds, the
/// timeout elapses, or `cancel` fires.
///
/// Never fails. Probe errors count as "not yet" and are logged at debug
/// level; whether [`WaitOutcome::NotFound`] is an error is up to the caller.
pub async fn await_condition<P>(
    page: &P,
    condition: &Condition,
    policy: WaitPolicy,
    cancel: &CancellationToken,
) -> WaitOutcome
where
    P: PageHandle + ?Sized,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => WaitOutcome::NotFound,
        watched = tokio::time::timeout(
            policy.timeout,
            watch_condition(page, condition, policy.poll_interval, None),
        ) => match watched {
            Ok(()) => WaitOutcome::Found,
            Err(_) => WaitOutcome::NotFound,
        },
    }
}

/// Like [`await_condition`], but absence is an error.
///
/// # Errors
///
/// Returns [`ScraperError::Cancelled`] if `cancel` fired during the wait,
/// otherwise [`ScraperError::WaitTimeout`] when the condition never held.
pub async fn require_condition<P>(
    page: &P,
    condition: &Condition,
    policy: WaitPolicy,
    cancel: &CancellationToken,
) -> Result<(), ScraperError>
where
    P: PageHandle + ?Sized,
{
    let started = Instant::now();
    match await_condition(page, condition, policy, cancel).await {
        WaitOutcome::Found => Ok(()),
        WaitOutcome::NotFound if cancel.is_cancelled() => Err(ScraperError::Cancelled),
        WaitOutcome::NotFound => Err(ScraperError::WaitTimeout {
            selector: condition.selector.clone(),
            waited_ms: started.elapsed().as_millis(),
        }),
    }
}

/// Probes until `condition` holds. Unbounded: callers wrap it in a timeout.
///
/// The most recent probe failure, if any, is written to `last_error`.
pub(crate) async fn watch_condition<P>(
    page: &P,
    condition: &Condition,
    poll_interval: Duration,
    last_error: Option<&Mutex<Option<String>>>,
) where
    P: PageHandle + ?Sized,
{
    loop {
        match page.probe(condition).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => {
                tracing::debug!(
                    selector = %condition.selector,
                    error = %e,
                    "condition probe failed"
                );
                if let Some(slot) = last_error {
                    if let Ok(mut guard) = slot.lock() {
                        *guard = Some(e.to_string());
                    }
                }
            }
        }
        tokio::time::sleep(poll_interval).await;
    }
}
