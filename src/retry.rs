//! Retry decisions and the bounded retry loop.
//!
//! The loop moves through `Idle -> Attempting -> {Succeeded, Retrying, Failed}`;
//! `Retrying` returns to `Attempting` after the backoff delay.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::{
    timeout::guard, Attempt, AttemptOutcome, CancelToken, ClientOptions, Execution, Outcome,
    RequestError,
};

/// Returns true when `error` is transient and another attempt is allowed.
pub fn should_retry(error: &RequestError, attempt_index: u32, options: &ClientOptions) -> bool {
    attempt_index < options.attempt_limit() && error.is_transient()
}

/// Delay to wait after attempt `attempt_index` failed.
///
/// `base_delay * backoff_multiplier^(attempt_index - 1)`, so the first retry
/// waits the base delay unscaled. Saturates instead of overflowing.
pub fn delay_for(attempt_index: u32, options: &ClientOptions) -> Duration {
    let exponent = attempt_index.saturating_sub(1).min(i32::MAX as u32) as i32;
    let factor = options.multiplier().powi(exponent);
    let nanos = options.base_delay().as_nanos() as f64 * factor;

    if nanos.is_finite() && nanos < u64::MAX as f64 {
        Duration::from_nanos(nanos.round() as u64)
    } else {
        Duration::from_nanos(u64::MAX)
    }
}

/// Runs `operation` under the timeout guard, retrying transient failures.
///
/// `operation` receives the 1-based attempt index. Exhausting the attempt
/// bound surfaces the last error only. Cancellation during an attempt or a
/// backoff wait ends the loop with [`RequestError::Cancelled`].
pub async fn run<F, Fut, T>(
    options: &ClientOptions,
    cancel: &CancelToken,
    mut operation: F,
) -> Execution<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, RequestError>>,
{
    let mut attempts = Vec::new();
    let mut attempt = 1u32;

    loop {
        #[cfg(feature = "tracing")]
        tracing::debug!(attempt, max_attempts = options.attempt_limit(), "starting attempt");

        let started_at = Instant::now();
        let result = guard(operation(attempt), options.timeout(), cancel).await;
        let elapsed = started_at.elapsed();

        let error = match result {
            Ok(payload) => {
                attempts.push(Attempt {
                    index: attempt,
                    started_at,
                    elapsed,
                    outcome: AttemptOutcome::Success,
                });

                #[cfg(feature = "tracing")]
                tracing::debug!(attempt, "request succeeded");

                return Execution {
                    outcome: Outcome::Success(payload),
                    attempts,
                };
            }
            Err(error) => error,
        };

        attempts.push(Attempt {
            index: attempt,
            started_at,
            elapsed,
            outcome: if error.is_transient() {
                AttemptOutcome::Transient
            } else {
                AttemptOutcome::Fatal
            },
        });

        if !should_retry(&error, attempt, options) {
            #[cfg(feature = "tracing")]
            tracing::warn!(attempt, error = %error, "request failed");

            return Execution {
                outcome: Outcome::failure(error),
                attempts,
            };
        }

        let delay = delay_for(attempt, options);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "retrying request after backoff"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Execution {
                    outcome: Outcome::failure(RequestError::Cancelled),
                    attempts,
                };
            }
            _ = sleep(delay) => {}
        }

        attempt += 1;
    }
}
