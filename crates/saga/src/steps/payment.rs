//! Payment step.

use async_trait::async_trait;
use domain::Order;

use crate::error::StepFailure;
use crate::order_fulfillment::{EXPIRED_CARD_SENTINEL, STEP_PROCESS_PAYMENT};
use crate::outcome::StepOutcome;
use crate::steps::SagaStep;

/// Validates the order's card. An expired card fails permanently.
#[derive(Debug, Clone)]
pub struct PaymentStep {
    expired_sentinel: String,
}

impl Default for PaymentStep {
    fn default() -> Self {
        Self::new(EXPIRED_CARD_SENTINEL)
    }
}

impl PaymentStep {
    /// Creates a payment step that rejects cards expiring at `expired_sentinel`.
    pub fn new(expired_sentinel: impl Into<String>) -> Self {
        Self {
            expired_sentinel: expired_sentinel.into(),
        }
    }
}

#[async_trait]
impl SagaStep for PaymentStep {
    fn name(&self) -> &'static str {
        STEP_PROCESS_PAYMENT
    }

    async fn execute(&self, order: &Order) -> StepOutcome {
        tracing::info!(order_id = %order.id, "processing payment");

        let expiration = order.card_expiration();
        if expiration == self.expired_sentinel {
            return StepOutcome::PermanentFailure(StepFailure::CreditCardExpired {
                expiration: expiration.to_string(),
            });
        }

        StepOutcome::Success(format!(
            "Payment processed for {} items.",
            order.item_count()
        ))
    }
}
