//! Order fulfillment saga constants and wiring.

use std::sync::Arc;
use std::time::Duration;

use domain::StockCatalog;

use crate::executor::SagaExecutor;
use crate::flags::FeatureFlags;
use crate::steps::{DeliveryStep, InventoryStep, PaymentStep};

/// The saga type identifier for order fulfillment.
pub const SAGA_TYPE: &str = "OrderFulfillment";

/// Step name: Charge the order's card.
pub const STEP_PROCESS_PAYMENT: &str = "process_payment";

/// Step name: Reserve inventory for the order.
pub const STEP_RESERVE_INVENTORY: &str = "reserve_inventory";

/// Step name: Hand the order to delivery.
pub const STEP_DELIVER_ORDER: &str = "deliver_order";

/// Card expiration treated as expired by the payment step.
pub const EXPIRED_CARD_SENTINEL: &str = "12/23";

/// Suffix marking a corrupted item name.
pub const MALFORMED_ITEM_SUFFIX: &str = "@@@";

/// How long the inventory step stalls while its outage is simulated.
pub const DEFAULT_OUTAGE_DELAY: Duration = Duration::from_secs(10);

/// Service name reported when the inventory outage is simulated.
pub const INVENTORY_SERVICE: &str = "inventory";

/// Executor wired with the three fulfillment steps.
pub type OrderFulfillmentExecutor = SagaExecutor<PaymentStep, InventoryStep, DeliveryStep>;

/// Builds the fulfillment executor with default step settings.
pub fn executor(
    catalog: Arc<StockCatalog>,
    flags: Arc<dyn FeatureFlags>,
) -> OrderFulfillmentExecutor {
    SagaExecutor::new(
        PaymentStep::default(),
        InventoryStep::new(catalog, flags),
        DeliveryStep,
    )
}
