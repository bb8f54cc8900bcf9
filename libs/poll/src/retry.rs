//! The fixed-interval retry loop.

use std::future::Future;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::BoxError;
use crate::{PollConfig, PollError};

/// Outcome of one evaluation of a poll condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation<T> {
    /// The condition holds.
    Matched(T),

    /// The condition does not hold yet; carries what was seen.
    Pending(String),

    /// The condition can no longer hold; carries what was seen.
    Failed(String),
}

/// Re-evaluate `condition` every `config.interval` until it matches.
///
/// The first attempt happens immediately. Sleeps are cut short at the
/// deadline so the final attempt happens exactly when `config.timeout`
/// elapses; if that attempt still does not match, the loop fails with
/// [`PollError::Timeout`] carrying the last pending observation. A timeout
/// too large to represent as a deadline never expires.
///
/// Errors returned by `condition` end the loop immediately.
pub async fn retry_until<T, E, F, Fut>(
    config: &PollConfig,
    what: &str,
    mut condition: F,
) -> Result<T, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Observation<T>, E>>,
    E: Into<BoxError>,
{
    let start = Instant::now();
    let deadline = start.checked_add(config.timeout);
    let interval = config.effective_interval();
    let mut attempts = 0u32;
    let mut last_observed: Option<String>;

    loop {
        attempts += 1;

        match condition().await {
            Ok(Observation::Matched(value)) => {
                debug!(
                    what = %what,
                    attempts,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Condition met"
                );
                return Ok(value);
            }
            Ok(Observation::Pending(observed)) => {
                debug!(what = %what, attempts, observed = %observed, "Condition not met yet");
                last_observed = Some(observed);
            }
            Ok(Observation::Failed(observed)) => {
                warn!(what = %what, attempts, observed = %observed, "Condition can no longer be met");
                return Err(PollError::UnexpectedState {
                    what: what.to_string(),
                    observed,
                });
            }
            Err(e) => {
                let source = e.into();
                warn!(what = %what, attempts, error = %source, "Poll attempt failed");
                return Err(PollError::Source {
                    what: what.to_string(),
                    source,
                });
            }
        }

        let now = Instant::now();
        let Some(deadline) = deadline else {
            tokio::time::sleep(interval).await;
            continue;
        };
        if now >= deadline {
            let elapsed = now.duration_since(start);
            warn!(
                what = %what,
                attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                last_observed = last_observed.as_deref().unwrap_or("nothing"),
                "Timed out"
            );
            return Err(PollError::Timeout {
                what: what.to_string(),
                elapsed,
                attempts,
                last_observed,
            });
        }

        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}
