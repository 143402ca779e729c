//! Retry policies and per-attempt decisions
//!
//! The retry coordinator wraps every logical operation. Each failed attempt
//! is classified into a fresh [`RetryDecision`]; nothing here is persisted
//! across requests.

use crate::transport::TransportError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where a retried attempt should be routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryTarget {
    /// Re-run on the node that just failed, preserving ordering and
    /// side-effect guarantees for non-idempotent statements.
    SameNode,
    /// Route to a different node; only safe for idempotent statements.
    NextNode,
}

/// Decision produced for one failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry {
        delay: Duration,
        target: RetryTarget,
    },
    /// Swallow the failure and report an empty result to the caller
    Ignore,
    /// Propagate the failure unchanged
    Rethrow,
}

/// Bounds for exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles per attempt thereafter
    pub base_delay: Duration,
    /// Cap applied after exponentiation, before jitter
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Retry policy selected per client
///
/// `FailFast` is the explicit no-op policy and the default: every failure
/// propagates on the first attempt. It exists as a named variant so that a
/// configured-but-inert policy can never be mistaken for one that retries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// Never retry, never ignore. One attempt per operation.
    FailFast,
    /// Retry retryable failures with exponential backoff and jitter.
    Backoff(BackoffPolicy),
    /// Like `Backoff`, but a retryable failure that exhausts its attempts is
    /// ignored and the caller receives an empty result. Validation errors
    /// still propagate.
    BackoffOrIgnore(BackoffPolicy),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::FailFast
    }
}

impl RetryPolicy {
    /// Classify one failed attempt.
    ///
    /// `attempt` is 1-based and counts the attempt that just failed.
    /// Classification rules:
    /// - timeouts, unavailability, and lost connections retry on a different
    ///   node when the statement is idempotent, on the same node otherwise,
    ///   with no delay;
    /// - coordinator overload retries on the same node with exponential
    ///   backoff;
    /// - invalid statements are never retried.
    pub fn decide(
        &self,
        error: &TransportError,
        idempotent: bool,
        attempt: u32,
    ) -> RetryDecision {
        let (bounds, ignore_exhausted) = match self {
            RetryPolicy::FailFast => return RetryDecision::Rethrow,
            RetryPolicy::Backoff(bounds) => (bounds, false),
            RetryPolicy::BackoffOrIgnore(bounds) => (bounds, true),
        };

        if matches!(error, TransportError::Invalid(_)) {
            return RetryDecision::Rethrow;
        }

        if attempt >= bounds.max_attempts {
            return if ignore_exhausted {
                RetryDecision::Ignore
            } else {
                RetryDecision::Rethrow
            };
        }

        match error {
            TransportError::Timeout
            | TransportError::Unavailable
            | TransportError::ConnectionLost(_) => RetryDecision::Retry {
                delay: Duration::ZERO,
                target: if idempotent {
                    RetryTarget::NextNode
                } else {
                    RetryTarget::SameNode
                },
            },
            TransportError::Overloaded => RetryDecision::Retry {
                delay: backoff_delay(attempt, bounds.base_delay, bounds.max_delay),
                target: RetryTarget::SameNode,
            },
            TransportError::Invalid(_) => RetryDecision::Rethrow,
        }
    }
}

/// Exponential backoff with multiplicative jitter.
///
/// `attempt` is the 1-based attempt that just failed, so the first retry
/// waits roughly `base`, the second roughly `2 * base`, capped at `max`.
/// Jitter scales the capped delay by a factor in [0.75, 1.25].
pub(crate) fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exp = attempt.saturating_sub(1).min(32);
    let raw = base.as_millis().saturating_mul(1u128 << exp);
    let capped = raw.min(max.as_millis()) as f64;
    let jitter: f64 = rand::thread_rng().gen_range(0.75..=1.25);
    Duration::from_millis((capped * jitter) as u64)
}
