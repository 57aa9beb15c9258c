//! Delivery step.

use async_trait::async_trait;
use domain::Order;

use crate::order_fulfillment::STEP_DELIVER_ORDER;
use crate::outcome::StepOutcome;
use crate::steps::SagaStep;

/// Finalizes the order. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeliveryStep;

#[async_trait]
impl SagaStep for DeliveryStep {
    fn name(&self) -> &'static str {
        STEP_DELIVER_ORDER
    }

    async fn execute(&self, order: &Order) -> StepOutcome {
        tracing::info!(order_id = %order.id, "delivering order");
        StepOutcome::Success(format!("Order delivered for {} items.", order.item_count()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Money, OrderItem, Payment};

    #[tokio::test]
    async fn test_delivery_always_succeeds() {
        let order = Order::new(
            vec![OrderItem::new("Unknown@@@", Money::zero(), 3)],
            Payment::card("1234", "12/23"),
        )
        .unwrap();
        assert_eq!(
            DeliveryStep.execute(&order).await,
            StepOutcome::Success("Order delivered for 1 items.".to_string())
        );
    }
}
