//! Retry policy applied to each saga step.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FailureKind, Result, SagaError};

/// Bounds on how a failing step is retried.
///
/// Backoff before retry `n` (1-based) is
/// `initial_interval * backoff_coefficient^(n-1)`, capped at `maximum_interval`.
/// A step stops retrying once it has made `max_attempts` attempts or once the
/// next wait would push its elapsed time past `max_elapsed`; either limit may
/// be left unbounded.
///
/// Built with [`RetryPolicy::builder`]; immutable afterwards. Deserializing
/// goes through the same validation, and omitted fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RetryPolicyFields")]
pub struct RetryPolicy {
    initial_interval: Duration,
    maximum_interval: Duration,
    backoff_coefficient: f64,
    max_attempts: Option<u32>,
    max_elapsed: Option<Duration>,
    attempt_timeout: Duration,
    non_retryable: BTreeSet<FailureKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            maximum_interval: Duration::from_secs(15),
            backoff_coefficient: 2.0,
            max_attempts: Some(5),
            max_elapsed: None,
            attempt_timeout: Duration::from_secs(5),
            non_retryable: BTreeSet::from([FailureKind::CreditCardExpired]),
        }
    }
}

impl RetryPolicy {
    /// Starts a builder seeded with the default policy.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            policy: Self::default(),
        }
    }

    pub fn initial_interval(&self) -> Duration {
        self.initial_interval
    }

    pub fn maximum_interval(&self) -> Duration {
        self.maximum_interval
    }

    pub fn backoff_coefficient(&self) -> f64 {
        self.backoff_coefficient
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    pub fn max_elapsed(&self) -> Option<Duration> {
        self.max_elapsed
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    pub fn non_retryable(&self) -> &BTreeSet<FailureKind> {
        &self.non_retryable
    }

    /// Returns false if failures of this kind must not be retried.
    pub fn is_retryable(&self, kind: FailureKind) -> bool {
        !self.non_retryable.contains(&kind)
    }

    /// Returns true once `attempts` attempts leave no room for another.
    pub fn attempts_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }

    /// Returns true if waiting until `elapsed` would cross the elapsed-time ceiling.
    pub fn exceeds_elapsed(&self, elapsed: Duration) -> bool {
        self.max_elapsed.is_some_and(|max| elapsed > max)
    }

    /// Like [`exceeds_elapsed`](Self::exceeds_elapsed) for `elapsed + wait`.
    /// A sum too large to represent is past any ceiling.
    pub fn exceeds_elapsed_after(&self, elapsed: Duration, wait: Duration) -> bool {
        match elapsed.checked_add(wait) {
            Some(total) => self.exceeds_elapsed(total),
            None => self.max_elapsed.is_some(),
        }
    }

    /// Returns the wait before retry number `retry` (1 for the first retry).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = self.backoff_coefficient.powi(exponent);
        let secs = self.initial_interval.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.maximum_interval.as_secs_f64() {
            return self.maximum_interval;
        }
        Duration::from_secs_f64(secs)
    }
}

/// Builder for [`RetryPolicy`]; validates on [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    pub fn initial_interval(mut self, interval: Duration) -> Self {
        self.policy.initial_interval = interval;
        self
    }

    pub fn maximum_interval(mut self, interval: Duration) -> Self {
        self.policy.maximum_interval = interval;
        self
    }

    pub fn backoff_coefficient(mut self, coefficient: f64) -> Self {
        self.policy.backoff_coefficient = coefficient;
        self
    }

    /// Limits the attempts per step. `None` removes the limit.
    pub fn max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.policy.max_attempts = attempts;
        self
    }

    /// Limits the time a step may spend retrying. `None` removes the limit.
    pub fn max_elapsed(mut self, elapsed: Option<Duration>) -> Self {
        self.policy.max_elapsed = elapsed;
        self
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.policy.attempt_timeout = timeout;
        self
    }

    /// Adds a failure kind that is never retried.
    pub fn non_retryable(mut self, kind: FailureKind) -> Self {
        self.policy.non_retryable.insert(kind);
        self
    }

    /// Makes every failure kind retryable, including the default exemptions.
    pub fn clear_non_retryable(mut self) -> Self {
        self.policy.non_retryable.clear();
        self
    }

    pub fn build(self) -> Result<RetryPolicy> {
        let p = &self.policy;
        if p.initial_interval.is_zero() {
            return Err(invalid("initial_interval", "must be greater than zero"));
        }
        if p.maximum_interval < p.initial_interval {
            return Err(invalid(
                "maximum_interval",
                format!(
                    "must be at least initial_interval ({:?})",
                    p.initial_interval
                ),
            ));
        }
        if !p.backoff_coefficient.is_finite() || p.backoff_coefficient < 1.0 {
            return Err(invalid("backoff_coefficient", "must be a finite value >= 1.0"));
        }
        if p.max_attempts == Some(0) {
            return Err(invalid("max_attempts", "must be at least 1"));
        }
        if p.attempt_timeout.is_zero() {
            return Err(invalid("attempt_timeout", "must be greater than zero"));
        }
        Ok(self.policy)
    }
}

/// Unvalidated wire form of [`RetryPolicy`].
#[derive(Deserialize)]
#[serde(default)]
struct RetryPolicyFields {
    initial_interval: Duration,
    maximum_interval: Duration,
    backoff_coefficient: f64,
    max_attempts: Option<u32>,
    max_elapsed: Option<Duration>,
    attempt_timeout: Duration,
    non_retryable: BTreeSet<FailureKind>,
}

impl Default for RetryPolicyFields {
    fn default() -> Self {
        let p = RetryPolicy::default();
        Self {
            initial_interval: p.initial_interval,
            maximum_interval: p.maximum_interval,
            backoff_coefficient: p.backoff_coefficient,
            max_attempts: p.max_attempts,
            max_elapsed: p.max_elapsed,
            attempt_timeout: p.attempt_timeout,
            non_retryable: p.non_retryable,
        }
    }
}

impl TryFrom<RetryPolicyFields> for RetryPolicy {
    type Error = SagaError;

    fn try_from(fields: RetryPolicyFields) -> Result<Self> {
        RetryPolicyBuilder {
            policy: RetryPolicy {
                initial_interval: fields.initial_interval,
                maximum_interval: fields.maximum_interval,
                backoff_coefficient: fields.backoff_coefficient,
                max_attempts: fields.max_attempts,
                max_elapsed: fields.max_elapsed,
                attempt_timeout: fields.attempt_timeout,
                non_retryable: fields.non_retryable,
            },
        }
        .build()
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> SagaError {
    SagaError::InvalidPolicy {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_exempts_expired_cards() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_retryable(FailureKind::CreditCardExpired));
        assert!(policy.is_retryable(FailureKind::ServiceUnavailable));
        assert!(policy.is_retryable(FailureKind::AttemptTimeout));
        assert_eq!(policy.attempt_timeout(), Duration::from_secs(5));
        assert_eq!(policy.maximum_interval(), Duration::from_secs(15));
    }

    #[test]
    fn test_backoff_doubles_up_to_maximum() {
        let policy = RetryPolicy::default();
        let waits: Vec<u64> = (1..=6).map(|n| policy.backoff_for(n).as_secs()).collect();
        assert_eq!(waits, [1, 2, 4, 8, 15, 15]);
    }

    #[test]
    fn test_backoff_is_monotonic_for_huge_retry_numbers() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(u32::MAX), policy.maximum_interval());
        assert!(policy.backoff_for(3) <= policy.backoff_for(4));
    }

    #[test]
    fn test_attempts_exhausted() {
        let policy = RetryPolicy::builder()
            .max_attempts(Some(3))
            .build()
            .unwrap();
        assert!(!policy.attempts_exhausted(2));
        assert!(policy.attempts_exhausted(3));

        let unbounded = RetryPolicy::builder().max_attempts(None).build().unwrap();
        assert!(!unbounded.attempts_exhausted(u32::MAX));
    }

    #[test]
    fn test_exceeds_elapsed() {
        let policy = RetryPolicy::builder()
            .max_elapsed(Some(Duration::from_secs(30)))
            .build()
            .unwrap();
        assert!(!policy.exceeds_elapsed(Duration::from_secs(30)));
        assert!(policy.exceeds_elapsed(Duration::from_secs(31)));
    }

    #[test]
    fn test_elapsed_sum_overflow_is_past_ceiling() {
        let bounded = RetryPolicy::builder()
            .max_elapsed(Some(Duration::from_secs(60)))
            .build()
            .unwrap();
        assert!(bounded.exceeds_elapsed_after(Duration::from_secs(1), Duration::MAX));
        assert!(!bounded.exceeds_elapsed_after(Duration::from_secs(1), Duration::from_secs(2)));

        let unbounded = RetryPolicy::default();
        assert!(!unbounded.exceeds_elapsed_after(Duration::from_secs(1), Duration::MAX));
    }

    #[test]
    fn test_deserialize_validates() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"max_attempts": 3}"#).unwrap();
        assert_eq!(policy.max_attempts(), Some(3));
        assert_eq!(policy.initial_interval(), Duration::from_secs(1));

        let json = serde_json::to_string(&RetryPolicy::default()).unwrap();
        let parsed: RetryPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, RetryPolicy::default());

        assert!(serde_json::from_str::<RetryPolicy>(r#"{"max_attempts": 0}"#).is_err());
        assert!(
            serde_json::from_str::<RetryPolicy>(
                r#"{"initial_interval": {"secs": 0, "nanos": 0}}"#
            )
            .is_err()
        );
    }

    #[test]
    fn test_builder_rejects_invalid_values() {
        assert!(
            RetryPolicy::builder()
                .initial_interval(Duration::ZERO)
                .build()
                .is_err()
        );
        assert!(
            RetryPolicy::builder()
                .initial_interval(Duration::from_secs(20))
                .maximum_interval(Duration::from_secs(10))
                .build()
                .is_err()
        );
        assert!(
            RetryPolicy::builder()
                .backoff_coefficient(0.5)
                .build()
                .is_err()
        );
        assert!(RetryPolicy::builder().max_attempts(Some(0)).build().is_err());
        assert!(
            RetryPolicy::builder()
                .attempt_timeout(Duration::ZERO)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_non_retryable_is_configurable() {
        let policy = RetryPolicy::builder()
            .clear_non_retryable()
            .non_retryable(FailureKind::AttemptTimeout)
            .build()
            .unwrap();
        assert!(policy.is_retryable(FailureKind::CreditCardExpired));
        assert!(!policy.is_retryable(FailureKind::AttemptTimeout));
    }
}
