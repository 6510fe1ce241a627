use crate::config::RetryConfig;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Run `operation` until it succeeds or `max_attempts` is reached, sleeping
/// `base * 2^n` plus up to `base` of jitter between attempts.
///
/// `should_retry` decides whether an error is worth another attempt.
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    config: &RetryConfig,
    requirement_id: &str,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempts = 0;
    let mut backoff_ms = config.backoff_base_ms;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempts >= max_attempts || !should_retry(&e) => {
                warn!(requirement_id, attempts, "Giving up: {}", e);
                return Err(e);
            }
            Err(e) => {
                let jitter = rand::thread_rng().gen_range(0..=config.backoff_base_ms);
                let delay = Duration::from_millis(backoff_ms.saturating_add(jitter));

                warn!(
                    requirement_id,
                    "Attempt {} failed: {}. Retrying in {:?}...", attempts, e, delay
                );

                sleep(delay).await;
                backoff_ms = backoff_ms.saturating_mul(2);
            }
        }
    }
}
