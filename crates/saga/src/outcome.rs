//! Step outcomes and the fulfillment summary.

use serde::{Deserialize, Serialize};

use crate::error::StepFailure;

/// Result of a single step attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step finished; the message becomes part of the summary.
    Success(String),

    /// A transient failure the executor may retry.
    RetryableFailure(StepFailure),

    /// A failure that must never be retried.
    PermanentFailure(StepFailure),
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Success(_))
    }
}

/// A step that completed successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedStep {
    pub step: String,
    pub message: String,
    /// Attempts it took, including the successful one.
    pub attempts: u32,
}

/// The externally visible result of a completed saga.
///
/// Built only from the completed steps' messages, in step order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentSummary {
    steps: Vec<CompletedStep>,
}

impl FulfillmentSummary {
    pub fn from_steps(steps: &[CompletedStep]) -> Self {
        Self {
            steps: steps.to_vec(),
        }
    }

    /// Returns the step messages in execution order.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.message.as_str())
    }

    /// Returns the message recorded for a step.
    pub fn message(&self, step: &str) -> Option<&str> {
        self.steps
            .iter()
            .find(|s| s.step == step)
            .map(|s| s.message.as_str())
    }

    pub fn steps(&self) -> &[CompletedStep] {
        &self.steps
    }
}

impl std::fmt::Display for FulfillmentSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Order fulfilled: ")?;
        for (i, message) in self.messages().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{message}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(step: &str, message: &str) -> CompletedStep {
        CompletedStep {
            step: step.into(),
            message: message.into(),
            attempts: 1,
        }
    }

    #[test]
    fn test_summary_joins_messages_in_order() {
        let summary = FulfillmentSummary::from_steps(&[
            step("process_payment", "Payment processed for 1 items."),
            step("reserve_inventory", "Inventory reserved for 1 items."),
            step("deliver_order", "Order delivered for 1 items."),
        ]);
        assert_eq!(
            summary.to_string(),
            "Order fulfilled: Payment processed for 1 items., \
             Inventory reserved for 1 items., Order delivered for 1 items."
        );
        assert_eq!(
            summary.message("reserve_inventory"),
            Some("Inventory reserved for 1 items.")
        );
    }

    #[test]
    fn test_summary_ignores_attempt_counts() {
        let mut retried = step("reserve_inventory", "Inventory reserved for 2 items.");
        retried.attempts = 4;
        let a = FulfillmentSummary::from_steps(&[retried]);
        let b = FulfillmentSummary::from_steps(&[step(
            "reserve_inventory",
            "Inventory reserved for 2 items.",
        )]);
        assert_eq!(a.to_string(), b.to_string());
    }
}
