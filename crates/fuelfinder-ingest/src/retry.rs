//! Retry with exponential back-off and jitter for export downloads.

use std::future::Future;
use std::time::Duration;

use crate::error::IngestError;

const MAX_DELAY_MS: u64 = 60_000;

/// `true` for failures a later attempt may not repeat: timeouts, connection
/// errors and 5xx responses. Parse and write errors are final.
pub(crate) fn is_retriable(err: &IngestError) -> bool {
    match err {
        IngestError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        IngestError::UnexpectedStatus { status, .. } => *status >= 500,
        IngestError::InvalidUrl { .. }
        | IngestError::Csv { .. }
        | IngestError::MissingColumn { .. }
        | IngestError::Io { .. }
        | IngestError::Serialize(_) => false,
    }
}

/// Sleep before retry `attempt` (1-based): `base * 2^(attempt-1)`, capped at
/// one minute, scaled by a random factor in `[0.75, 1.25)`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn backoff_delay_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors. Non-retriable errors return immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    what: &str,
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, IngestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, IngestError>>,
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
                let delay_ms = backoff_delay_ms(backoff_base_ms, attempt);
                tracing::warn!(
                    what,
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient download error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
