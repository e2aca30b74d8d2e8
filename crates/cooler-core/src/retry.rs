//! Policy-based retry execution
//!
//! Delays follow the configured [`RetryStrategy`] and are capped at
//! `max_delay_ms`. A predicate decides which errors are worth another attempt.
//!
//! # Example
//!
//! ```rust,no_run
//! use cooler_core::retry::retry_with_policy;
//! use cooler_core::types::RetryPolicy;
//!
//! async fn example() -> Result<String, std::io::Error> {
//!     let policy = RetryPolicy::default();
//!
//!     retry_with_policy(&policy, "fetch", |_| true, || async {
//!         Ok("success".to_string())
//!     })
//!     .await
//! }
//! ```

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::{RetryPolicy, RetryStrategy};

/// Calculate the delay before the next attempt
///
/// `attempt` is the 1-indexed number of the attempt that just failed.
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let attempt_index = attempt.saturating_sub(1);

    let base_delay_ms = match policy.strategy {
        RetryStrategy::None => 0,

        RetryStrategy::FixedDelay => policy.initial_delay_ms,

        RetryStrategy::ExponentialBackoff => {
            let multiplier = policy.backoff_multiplier.powf(attempt_index as f64);
            (policy.initial_delay_ms as f64 * multiplier) as u64
        }

        RetryStrategy::LinearBackoff => policy.initial_delay_ms * (attempt_index as u64 + 1),
    };

    Duration::from_millis(base_delay_ms.min(policy.max_delay_ms))
}

/// Run `op` until it succeeds, the predicate rejects the error, or the
/// policy's attempts are used up. Returns the last error on failure.
pub async fn retry_with_policy<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    operation: &str,
    should_retry: P,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = match policy.strategy {
        RetryStrategy::None => 1,
        _ => policy.max_attempts.max(1),
    };
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation, attempt);
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts && should_retry(&e) => {
                let delay = calculate_delay(policy, attempt);
                warn!(
                    "{} attempt {}/{} failed: {}; retrying in {}ms",
                    operation,
                    attempt,
                    max_attempts,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
