//! Retry with exponential back-off and jitter for map script loading.
//!
//! [`retry_with_backoff`] wraps one load attempt and retries when the tag
//! fired `onerror` or never answered. A script that loaded without defining
//! its global is returned immediately: a bad key or blocked domain does not
//! fix itself.

use std::future::Future;
use std::time::Duration;

use crate::error::LoadError;

pub(crate) fn is_retriable(err: &LoadError) -> bool {
    match err {
        LoadError::ScriptFailed { .. } | LoadError::TimedOut { .. } => true,
        LoadError::GlobalMissing(_) => false,
    }
}

/// Delay before retry number `attempt` (1-based), before jitter.
fn base_delay_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10))
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors, doubling the delay each time with ±25 % jitter.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, LoadError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LoadError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let base = base_delay_ms(backoff_base_ms, attempt);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (base as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "map script load failed, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn failed() -> LoadError {
        LoadError::ScriptFailed {
            url: "https://dapi.kakao.com/v2/maps/sdk.js".to_string(),
        }
    }

    #[test]
    fn failed_and_timed_out_are_retriable() {
        assert!(is_retriable(&failed()));
        assert!(is_retriable(&LoadError::TimedOut {
            url: "x".to_string(),
            timeout_ms: 10
        }));
    }

    #[test]
    fn missing_global_is_not_retriable() {
        assert!(!is_retriable(&LoadError::GlobalMissing("kakao".to_string())));
    }

    #[test]
    fn delay_doubles_per_attempt() {
        assert_eq!(base_delay_ms(1_000, 1), 1_000);
        assert_eq!(base_delay_ms(1_000, 2), 2_000);
        assert_eq!(base_delay_ms(1_000, 3), 4_000);
    }

    #[test]
    fn delay_saturates_instead_of_overflowing() {
        assert_eq!(base_delay_ms(u64::MAX, 5), u64::MAX);
        assert_eq!(base_delay_ms(1, 40), 1 << 10);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, LoadError>(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), LoadError> = retry_with_backoff(2, 1_000, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(failed())
            }
        })
        .await;
        assert_eq!(result.unwrap_err(), failed());
        assert_eq!(calls.load(Ordering::SeqCst), 3, "1 initial + 2 retries");
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 1_000, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(failed())
                } else {
                    Ok(())
                }
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_missing_global() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), LoadError> = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(LoadError::GlobalMissing("google".to_string()))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
