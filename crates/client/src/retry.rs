//! Bounded retry with exponential backoff around a single lookup.
//!
//! The loop is explicit (attempt counter plus computed delay, no
//! recursion). Recoverable errors retry until the ceiling and then skip
//! the pair; rate-limiting retries until the ceiling and then stops the
//! whole run; quota exhaustion stops the run without retrying at all.

use std::time::Duration;

use crate::lookup::{LookupError, RawRequirement, RequirementLookup};

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts per lookup before giving up.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`RetryConfig::max_delay`].
pub fn next_delay(current: Duration, config: &RetryConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Why the whole run must end, not just this pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    RateLimited,
    QuotaExceeded,
}

/// Resolution of one budgeted lookup after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The remote answered; the payload still needs normalizing.
    Success(RawRequirement),
    /// Retries exhausted on recoverable failures; skip this pair only.
    Skipped,
    /// Terminal condition; abandon the current item and end the run.
    Stop(StopSignal),
}

/// Drive one lookup to resolution through the retry policy.
pub async fn lookup_with_retry<L: RequirementLookup + ?Sized>(
    lookup: &L,
    passport: &str,
    destination: &str,
    config: &RetryConfig,
) -> LookupOutcome {
    let mut delay = config.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match lookup.lookup(passport, destination).await {
            Ok(raw) => return LookupOutcome::Success(raw),
            Err(LookupError::QuotaExceeded) => {
                tracing::warn!(passport, destination, "Lookup quota exhausted");
                return LookupOutcome::Stop(StopSignal::QuotaExceeded);
            }
            Err(e @ LookupError::RateLimited) => {
                if attempt >= config.max_attempts {
                    tracing::warn!(
                        passport,
                        destination,
                        attempts = attempt,
                        "Still rate limited after final attempt, stopping run",
                    );
                    return LookupOutcome::Stop(StopSignal::RateLimited);
                }
                tracing::debug!(
                    passport,
                    destination,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Rate limited, backing off",
                );
            }
            Err(e) => {
                if attempt >= config.max_attempts {
                    tracing::warn!(
                        passport,
                        destination,
                        attempts = attempt,
                        error = %e,
                        "Lookup failed after final attempt, skipping pair",
                    );
                    return LookupOutcome::Skipped;
                }
                tracing::debug!(
                    passport,
                    destination,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Lookup failed, backing off",
                );
            }
        }

        tokio::time::sleep(delay).await;
        delay = next_delay(delay, config);
    }
}
