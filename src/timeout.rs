//! Deadline and cancellation guard around a single attempt.

use std::future::Future;
use std::time::Duration;

use crate::{CancelToken, RequestError};

/// Runs `attempt` until it completes, `timeout` elapses, or `cancel` fires.
///
/// Whichever branch loses is dropped before returning: the timer is released
/// on success and the in-flight call is aborted on timeout or cancellation.
/// Aborting is best-effort; the remote side may still finish processing.
pub async fn guard<F, T>(attempt: F, timeout: Duration, cancel: &CancelToken) -> Result<T, RequestError>
where
    F: Future<Output = Result<T, RequestError>>,
{
    if cancel.is_cancelled() {
        return Err(RequestError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RequestError::Cancelled),
        result = tokio::time::timeout(timeout, attempt) => match result {
            Ok(outcome) => outcome,
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "attempt timed out");
                Err(RequestError::Timeout)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };
    use std::time::Duration;

    use super::guard;
    use crate::{CancelToken, RequestError};

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn passes_through_fast_result() {
        let result = guard(
            async { Ok::<_, RequestError>(7) },
            Duration::from_secs(1),
            &CancelToken::new(),
        )
        .await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn passes_through_attempt_error() {
        let result: Result<(), _> = guard(
            async { Err(RequestError::Connection("refused".into())) },
            Duration::from_secs(1),
            &CancelToken::new(),
        )
        .await;
        assert_eq!(result, Err(RequestError::Connection("refused".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempt_times_out_and_is_dropped() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = DropFlag(dropped.clone());
        let started = tokio::time::Instant::now();

        let result: Result<(), _> = guard(
            async move {
                let _flag = flag;
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            },
            Duration::from_millis(500),
            &CancelToken::new(),
        )
        .await;

        assert_eq!(result, Err(RequestError::Timeout));
        assert_eq!(started.elapsed(), Duration::from_millis(500));
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts_wait() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });
        let started = tokio::time::Instant::now();

        let result: Result<(), _> = guard(
            async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            },
            Duration::from_secs(10),
            &cancel,
        )
        .await;

        assert_eq!(result, Err(RequestError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn cancelled_token_skips_attempt() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let ran = Arc::new(AtomicBool::new(false));
        let seen = ran.clone();

        let result: Result<(), _> = guard(
            async move {
                seen.store(true, Ordering::SeqCst);
                Ok(())
            },
            Duration::from_secs(1),
            &cancel,
        )
        .await;

        assert_eq!(result, Err(RequestError::Cancelled));
        assert!(!ran.load(Ordering::SeqCst));
    }
}
