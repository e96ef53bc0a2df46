//! First-observed-wins race over several [`Condition`]s on one page.
//!
//! Each condition gets a watcher future that polls [`PageHandle::probe`].
//! The watchers are driven together inside the caller's task through a
//! [`FuturesUnordered`], so there is nothing spawned that could outlive the
//! race. Every watcher also listens on a child [`CancellationToken`], which
//! is cancelled as soon as the race settles.

use std::sync::Mutex;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::page::{Condition, PageHandle};
use crate::wait::{watch_condition, WaitPolicy};

#[derive(Debug, Error)]
pub enum RaceError {
    #[error("race started with no conditions")]
    NoConditions,

    #[error("no condition held within {}ms{}", .waited.as_millis(), last_cause_suffix(.last_cause))]
    Timeout {
        waited: Duration,
        last_cause: Option<String>,
    },

    #[error("race cancelled")]
    Cancelled,
}

fn last_cause_suffix(cause: &Option<String>) -> String {
    cause
        .as_deref()
        .map(|c| format!(" (last probe error: {c})"))
        .unwrap_or_default()
}

/// The condition that was observed first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceWinner {
    /// Position of the winning condition in the slice handed to the race.
    pub index: usize,
    pub condition: Condition,
}

/// Races `conditions` under one shared deadline.
///
/// Exactly one winner is reported. Once it is known the remaining watchers
/// are cancelled and dropped before this function returns, so a loser can
/// never report afterwards.
///
/// # Errors
///
/// - [`RaceError::NoConditions`] if `conditions` is empty.
/// - [`RaceError::Timeout`] if nothing held within `policy.timeout`.
/// - [`RaceError::Cancelled`] if `cancel` fired first.
pub async fn race_conditions<P>(
    page: &P,
    conditions: &[Condition],
    policy: WaitPolicy,
    cancel: &CancellationToken,
) -> Result<RaceWinner, RaceError>
where
    P: PageHandle + ?Sized,
{
    if conditions.is_empty() {
        return Err(RaceError::NoConditions);
    }

    let race_token = cancel.child_token();
    let last_error: Mutex<Option<String>> = Mutex::new(None);
    let started = Instant::now();

    let settled = {
        let mut watchers: FuturesUnordered<_> = conditions
            .iter()
            .enumerate()
            .map(|(index, condition)| {
                let token = race_token.clone();
                let last_error = &last_error;
                async move {
                    let watch =
                        watch_condition(page, condition, policy.poll_interval, Some(last_error));
                    tokio::select! {
                        biased;
                        () = token.cancelled() => None,
                        () = watch => Some(index),
                    }
                }
            })
            .collect();

        let first_observed = async {
            while let Some(finished) = watchers.next().await {
                if finished.is_some() {
                    return finished;
                }
            }
            None
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(RaceError::Cancelled),
            raced = tokio::time::timeout(policy.timeout, first_observed) => match raced {
                Ok(Some(index)) => Ok(index),
                // Every watcher stopped on the token without a winner.
                Ok(None) => Err(RaceError::Cancelled),
                Err(_) => Err(RaceError::Timeout {
                    waited: started.elapsed(),
                    last_cause: last_error.lock().ok().and_then(|guard| guard.clone()),
                }),
            },
        }
    };
    race_token.cancel();

    let index = settled?;
    let condition = conditions[index].clone();
    tracing::debug!(
        index,
        selector = %condition.selector,
        elapsed_ms = started.elapsed().as_millis(),
        "race settled"
    );
    Ok(RaceWinner { index, condition })
}
