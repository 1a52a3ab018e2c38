//! Linear-backoff retry for Conversions API delivery.
//!
//! The delivery contract retries any non-2xx response or network failure a
//! fixed number of additional attempts with a linearly increasing delay
//! (`base × attempt`), then gives up; the caller logs and swallows the final
//! error. Malformed response bodies are not retried — resending the same
//! payload cannot fix them.

use std::future::Future;
use std::time::Duration;

use crate::error::MetaError;

/// Returns `true` for errors worth another delivery attempt.
pub(crate) fn is_retriable(err: &MetaError) -> bool {
    match err {
        MetaError::Http(_) | MetaError::Api { .. } => true,
        MetaError::Deserialize { .. } | MetaError::BaseUrl(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts.
///
/// # Backoff schedule (example with `base_ms = 1000`)
///
/// | Attempt | Sleep before next attempt |
/// |---------|---------------------------|
/// | 1       | 1000 × 1 = 1 s            |
/// | 2       | 1000 × 2 = 2 s            |
/// | 3       | 1000 × 3 = 3 s            |
///
/// With `max_retries = 3` the operation runs at most 4 times total.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    base_ms: u64,
    mut operation: F,
) -> Result<T, MetaError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MetaError>>,
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
                let delay_ms = base_ms.saturating_mul(u64::from(attempt));
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "Conversions API delivery failed — retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
