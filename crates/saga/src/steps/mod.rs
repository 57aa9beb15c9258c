//! The fulfillment steps and the trait the executor drives them through.

pub mod delivery;
pub mod inventory;
pub mod payment;

use std::sync::Arc;

use async_trait::async_trait;
use domain::Order;

use crate::outcome::StepOutcome;

pub use delivery::DeliveryStep;
pub use inventory::{InventoryStep, normalize_item_name};
pub use payment::PaymentStep;

/// A single saga step.
///
/// Steps hold no per-order state: the outcome depends only on the order and
/// the environment the step was built with. The executor alone decides
/// whether a failed outcome is retried.
#[async_trait]
pub trait SagaStep: Send + Sync {
    /// Stable step name used in events, logs and failures.
    fn name(&self) -> &'static str;

    /// Runs one attempt of the step.
    async fn execute(&self, order: &Order) -> StepOutcome;
}

#[async_trait]
impl<T: SagaStep + ?Sized> SagaStep for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn execute(&self, order: &Order) -> StepOutcome {
        (**self).execute(order).await
    }
}
