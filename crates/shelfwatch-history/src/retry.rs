//! Retry with exponential back-off and jitter for store requests.
//!
//! Rate limiting, 5xx responses and network failures are retried; anything
//! else (404, auth failures, bad payloads) is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::HistoryError;

pub(crate) fn is_retriable(err: &HistoryError) -> bool {
    match err {
        HistoryError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        HistoryError::RateLimited { .. } => true,
        HistoryError::UnexpectedStatus { status, .. } => *status >= 500,
        HistoryError::Csv(_)
        | HistoryError::Io { .. }
        | HistoryError::Deserialize { .. }
        | HistoryError::NotFound { .. }
        | HistoryError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors.
///
/// The wait before retry `n` is `backoff_base_ms × 2^(n-1)` scaled by a
/// random factor in `[0.75, 1.25)`, capped at 60 s. A rate-limit response
/// waits at least its `Retry-After`.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, HistoryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HistoryError>>,
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
                let jitter = rand::random::<f64>() * 0.5 + 0.75;
                let delay = retry_delay(&err, attempt, backoff_base_ms, jitter);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "history store request failed; retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Wait before retry number `attempt` (1-based), with `jitter` applied to
/// the exponential part only.
fn retry_delay(err: &HistoryError, attempt: u32, backoff_base_ms: u64, jitter: f64) -> Duration {
    const MAX_DELAY_MS: u64 = 60_000;
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let backoff = Duration::from_millis((capped as f64 * jitter) as u64);
    match err {
        HistoryError::RateLimited {
            retry_after_secs, ..
        } => backoff.max(Duration::from_secs(*retry_after_secs)),
        _ => backoff,
    }
}
