//! Retry with exponential back-off and jitter for Storefront API calls.
//!
//! Only transient conditions (429, network failures, 5xx) are retried; a
//! GraphQL error or an unparseable body is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ShopifyError;

const MAX_DELAY_MS: u64 = 30_000;

/// Returns `true` if `err` is worth retrying after a back-off delay.
fn is_retriable(err: &ShopifyError) -> bool {
    match err {
        ShopifyError::RateLimited { .. } => true,
        ShopifyError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ShopifyError::UnexpectedStatus { status, .. } => *status >= 500,
        ShopifyError::Deserialize { .. }
        | ShopifyError::GraphQl { .. }
        | ShopifyError::InvalidBaseUrl { .. } => false,
    }
}

/// Executes `operation`, retrying up to `max_retries` additional times on
/// transient errors.
///
/// The wait before retry `n` is `backoff_base_ms * 2^(n-1)` capped at 30 s,
/// scaled by a ±25 % jitter. With `max_retries = 2` the operation runs at
/// most three times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ShopifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ShopifyError>>,
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
                let delay_ms = backoff_delay_ms(
                    &err,
                    attempt,
                    backoff_base_ms,
                    rand::random::<f64>() * 0.5 + 0.75,
                );
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient Storefront API error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based). `jitter` scales the
/// exponential term; a 429's `Retry-After` acts as a floor, itself capped at
/// [`MAX_DELAY_MS`].
fn backoff_delay_ms(err: &ShopifyError, attempt: u32, backoff_base_ms: u64, jitter: f64) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * jitter) as u64;
    match err {
        ShopifyError::RateLimited { retry_after_secs } => {
            jittered.max(retry_after_secs.saturating_mul(1000).min(MAX_DELAY_MS))
        }
        _ => jittered,
    }
}
