//! Saga error types.
//!
//! Step failures are split by the executor into two families:
//! - permanent business-rule failures, never retried
//! - retryable infrastructure failures, retried per [`RetryPolicy`](crate::RetryPolicy)
//!
//! A saga that cannot complete ends in a [`TerminalFailure`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outcome::CompletedStep;

/// Tag identifying the kind of a [`StepFailure`].
///
/// Retry policies list the kinds they refuse to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FailureKind {
    CreditCardExpired,
    ItemNotFound,
    ServiceUnavailable,
    AttemptTimeout,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::CreditCardExpired => "CreditCardExpired",
            FailureKind::ItemNotFound => "ItemNotFound",
            FailureKind::ServiceUnavailable => "ServiceUnavailable",
            FailureKind::AttemptTimeout => "AttemptTimeout",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The cause of a failed step attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StepFailure {
    /// The payment card is expired.
    #[error("Payment failed: credit card expired ({expiration})")]
    CreditCardExpired { expiration: String },

    /// An ordered item does not exist in the stock catalog.
    #[error("Couldn't find item in stock database: {item}")]
    ItemNotFound { item: String },

    /// A downstream service did not answer.
    #[error("{service} service unavailable")]
    ServiceUnavailable { service: String },

    /// The attempt did not finish within the per-attempt timeout.
    #[error("Attempt timed out after {timeout:?}")]
    AttemptTimeout { timeout: Duration },
}

impl StepFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            StepFailure::CreditCardExpired { .. } => FailureKind::CreditCardExpired,
            StepFailure::ItemNotFound { .. } => FailureKind::ItemNotFound,
            StepFailure::ServiceUnavailable { .. } => FailureKind::ServiceUnavailable,
            StepFailure::AttemptTimeout { .. } => FailureKind::AttemptTimeout,
        }
    }
}

/// Why a saga stopped short of completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "failure")]
pub enum TerminalReason {
    /// The step reported a permanent failure, or a failure whose kind the
    /// policy exempts from retry.
    Permanent(StepFailure),

    /// Retryable failures continued until the attempt or elapsed-time limit.
    RetriesExhausted(StepFailure),

    /// Execution was canceled from outside.
    Canceled,
}

impl TerminalReason {
    /// Returns the underlying failure, if any.
    pub fn failure(&self) -> Option<&StepFailure> {
        match self {
            TerminalReason::Permanent(failure) | TerminalReason::RetriesExhausted(failure) => {
                Some(failure)
            }
            TerminalReason::Canceled => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalReason::Permanent(_) => "PermanentFailure",
            TerminalReason::RetriesExhausted(_) => "RetriesExhausted",
            TerminalReason::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminalReason::Permanent(failure) => {
                write!(f, "permanent failure ({}): {failure}", failure.kind())
            }
            TerminalReason::RetriesExhausted(failure) => {
                write!(f, "retries exhausted ({}): {failure}", failure.kind())
            }
            TerminalReason::Canceled => write!(f, "canceled"),
        }
    }
}

/// The terminal result of a saga that did not complete.
///
/// Names the failing step and keeps the messages of every step that
/// completed before it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Saga step '{step}' failed after {attempts} attempt(s): {reason}")]
pub struct TerminalFailure {
    /// The step that was running when the saga stopped.
    pub step: String,
    pub reason: TerminalReason,
    /// Attempts made on the failing step.
    pub attempts: u32,
    /// Steps that completed before the failure, in execution order.
    pub completed: Vec<CompletedStep>,
}

impl TerminalFailure {
    /// Returns the failure kind, or `None` when canceled.
    pub fn kind(&self) -> Option<FailureKind> {
        self.reason.failure().map(StepFailure::kind)
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self.reason, TerminalReason::Permanent(_))
    }

    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self.reason, TerminalReason::RetriesExhausted(_))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self.reason, TerminalReason::Canceled)
    }
}

/// Errors raised while configuring the saga.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A retry policy parameter is out of range.
    #[error("Invalid retry policy: {field} {reason}")]
    InvalidPolicy { field: &'static str, reason: String },
}

/// Convenience type alias for saga configuration results.
pub type Result<T> = std::result::Result<T, SagaError>;
