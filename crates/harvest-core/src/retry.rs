//! Retry policy and bounded retry execution.
//!
//! Both external clients (the bolt store and the inference server)
//! share the same contract: a bounded number of attempts with a
//! **constant** delay between them. The delay is deliberately not
//! exponential — callers tune timing through `delay_ms` alone, and
//! observable retry timing stays flat under test.
//!
//! - [`RetryPolicy`]: attempt budget, delay, optional jitter
//! - [`Retryable`]: error classification implemented by client errors
//! - [`run_with_retry`]: async executor that enforces the budget

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ─────────────────────────────────────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Default maximum attempts (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default delay between attempts in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 5_000;

/// Bounded constant-backoff retry policy.
///
/// Constructed once per client and shared by reference. `max_attempts`
/// counts the first try, so a policy of 1 never sleeps.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Constant delay between attempts in ms (default: 5000).
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Optional symmetric jitter factor (0.0–1.0). `None` disables jitter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter_factor: Option<f64>,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_DELAY_MS,
            jitter_factor: None,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with an explicit budget and delay, no jitter.
    #[must_use]
    pub fn new(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay_ms,
            jitter_factor: None,
        }
    }

    /// Delay to sleep after a failed attempt.
    ///
    /// Constant backoff; with jitter enabled the delay varies by
    /// ±`jitter_factor` around `delay_ms` using the supplied random
    /// value in `[0.0, 1.0)`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn delay_with_random(&self, random: f64) -> Duration {
        let Some(factor) = self.jitter_factor else {
            return Duration::from_millis(self.delay_ms);
        };
        // Maps random [0,1) to [-factor, +factor]
        let jitter = 1.0 + (random * 2.0 - 1.0) * factor.clamp(0.0, 1.0);
        let ms = (self.delay_ms as f64 * jitter).round().max(0.0) as u64;
        Duration::from_millis(ms)
    }

    /// Delay to sleep after a failed attempt, sampling jitter if enabled.
    #[must_use]
    pub fn delay(&self) -> Duration {
        if self.jitter_factor.is_some() {
            self.delay_with_random(rand::random::<f64>())
        } else {
            Duration::from_millis(self.delay_ms)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classification
// ─────────────────────────────────────────────────────────────────────────────

/// Error classification for retry decisions.
///
/// Retryable errors are transient infrastructure failures where
/// re-attempting after a delay has a reasonable chance of success.
/// Contract violations and malformed input must return `false` so the
/// executor aborts on the first occurrence.
pub trait Retryable {
    /// Whether re-attempting the failed operation makes sense.
    fn is_retryable(&self) -> bool;
}

// ─────────────────────────────────────────────────────────────────────────────
// Executor
// ─────────────────────────────────────────────────────────────────────────────

/// Run `op` up to `policy.max_attempts` times.
///
/// Sleeps `policy.delay()` between attempts, so attempt N+1 starts no
/// earlier than the delay after attempt N's failure. Non-retryable
/// errors abort immediately; on exhaustion the last error is returned
/// unchanged so callers keep the original error type.
pub async fn run_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    op_name: &str,
    mut op: F,
) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                warn!(
                    op = op_name,
                    attempt,
                    max_attempts,
                    error = %err,
                    "attempt failed, retrying after delay"
                );
                tokio::time::sleep(policy.delay()).await;
                attempt += 1;
            }
            Err(err) => {
                warn!(
                    op = op_name,
                    attempt,
                    max_attempts,
                    retryable = err.is_retryable(),
                    error = %err,
                    "attempt failed, giving up"
                );
                return Err(err);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
