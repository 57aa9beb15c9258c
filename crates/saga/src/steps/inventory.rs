//! Inventory reservation step.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::{Order, StockCatalog};

use crate::error::StepFailure;
use crate::flags::FeatureFlags;
use crate::order_fulfillment::{
    DEFAULT_OUTAGE_DELAY, INVENTORY_SERVICE, MALFORMED_ITEM_SUFFIX, STEP_RESERVE_INVENTORY,
};
use crate::outcome::StepOutcome;
use crate::steps::SagaStep;

/// Strips every trailing malformation marker from an item name.
///
/// Idempotent: a clean name is returned unchanged.
pub fn normalize_item_name(item_name: &str) -> &str {
    item_name.trim_end_matches(MALFORMED_ITEM_SUFFIX)
}

/// Checks every ordered item against the stock catalog.
///
/// Reservation is observational: stock counts are not decremented.
/// Flags are read at the start of every attempt.
pub struct InventoryStep {
    catalog: Arc<StockCatalog>,
    flags: Arc<dyn FeatureFlags>,
    outage_delay: Duration,
}

impl InventoryStep {
    pub fn new(catalog: Arc<StockCatalog>, flags: Arc<dyn FeatureFlags>) -> Self {
        Self {
            catalog,
            flags,
            outage_delay: DEFAULT_OUTAGE_DELAY,
        }
    }

    /// Sets how long an attempt stalls while the outage is simulated.
    pub fn with_outage_delay(mut self, delay: Duration) -> Self {
        self.outage_delay = delay;
        self
    }
}

impl std::fmt::Debug for InventoryStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryStep")
            .field("catalog_items", &self.catalog.len())
            .field("outage_delay", &self.outage_delay)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SagaStep for InventoryStep {
    fn name(&self) -> &'static str {
        STEP_RESERVE_INVENTORY
    }

    async fn execute(&self, order: &Order) -> StepOutcome {
        if !self.flags.inventory_service_available().await {
            tracing::warn!(
                order_id = %order.id,
                delay = ?self.outage_delay,
                "simulating inventory service timeout"
            );
            tokio::time::sleep(self.outage_delay).await;
            return StepOutcome::RetryableFailure(StepFailure::ServiceUnavailable {
                service: INVENTORY_SERVICE.to_string(),
            });
        }

        tracing::info!(order_id = %order.id, "reserving inventory");
        let normalize = self.flags.item_names_fix_enabled().await;

        for item in &order.items {
            let lookup_name = if normalize {
                let repaired = normalize_item_name(&item.item_name);
                if repaired.len() != item.item_name.len() {
                    tracing::info!(
                        original = %item.item_name,
                        repaired,
                        "removed malformation marker from item name"
                    );
                }
                repaired
            } else {
                item.item_name.as_str()
            };

            if !self.catalog.contains(lookup_name) {
                return StepOutcome::PermanentFailure(StepFailure::ItemNotFound {
                    item: item.item_name.clone(),
                });
            }
            tracing::debug!(item = lookup_name, quantity = item.quantity, "item reserved");
        }

        StepOutcome::Success(format!(
            "Inventory reserved for {} items.",
            order.item_count()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::StaticFlags;
    use domain::{Money, OrderItem, Payment, StockItem};

    fn catalog() -> Arc<StockCatalog> {
        Arc::new(
            StockCatalog::new(vec![
                StockItem::new("Widget", Money::from_dollars(50), 10),
                StockItem::new("Gadget", Money::from_dollars(20), 5),
            ])
            .unwrap(),
        )
    }

    fn order(names: &[&str]) -> Order {
        Order::new(
            names
                .iter()
                .map(|n| OrderItem::new(*n, Money::from_dollars(1), 1))
                .collect(),
            Payment::card("1234", "12/25"),
        )
        .unwrap()
    }

    fn step(flags: &Arc<StaticFlags>) -> InventoryStep {
        InventoryStep::new(catalog(), flags.clone())
    }

    #[test]
    fn test_normalize_is_idempotent() {
        assert_eq!(normalize_item_name("Widget"), "Widget");
        assert_eq!(normalize_item_name("Widget@@@"), "Widget");
        assert_eq!(normalize_item_name("Widget@@@@@@"), "Widget");
        let once = normalize_item_name("Gadget@@@");
        assert_eq!(normalize_item_name(once), once);
        // Only a suffix counts as the marker.
        assert_eq!(normalize_item_name("@@@Widget"), "@@@Widget");
    }

    #[tokio::test]
    async fn test_all_items_found() {
        let flags = Arc::new(StaticFlags::new());
        let outcome = step(&flags).execute(&order(&["Widget", "Gadget"])).await;
        assert_eq!(
            outcome,
            StepOutcome::Success("Inventory reserved for 2 items.".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_item_fails_permanently() {
        let flags = Arc::new(StaticFlags::new());
        let outcome = step(&flags)
            .execute(&order(&["Widget", "Sprocket", "Gizmo"]))
            .await;
        assert_eq!(
            outcome,
            StepOutcome::PermanentFailure(StepFailure::ItemNotFound {
                item: "Sprocket".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_marker_fails_without_normalization() {
        let flags = Arc::new(StaticFlags::new());
        let outcome = step(&flags).execute(&order(&["Widget@@@"])).await;
        assert_eq!(
            outcome,
            StepOutcome::PermanentFailure(StepFailure::ItemNotFound {
                item: "Widget@@@".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_marker_is_stripped_with_normalization() {
        let flags = Arc::new(StaticFlags::new());
        flags.set_item_names_fix(true);
        let outcome = step(&flags).execute(&order(&["Widget@@@", "Gadget"])).await;
        assert!(outcome.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_outage_stalls_then_fails_retryably() {
        let flags = Arc::new(StaticFlags::new());
        flags.set_inventory_available(false);
        // The catalog is never consulted, so even unknown items fail retryably.
        let started = tokio::time::Instant::now();
        let outcome = step(&flags).execute(&order(&["Sprocket"])).await;

        assert!(started.elapsed() >= DEFAULT_OUTAGE_DELAY);
        assert_eq!(
            outcome,
            StepOutcome::RetryableFailure(StepFailure::ServiceUnavailable {
                service: "inventory".to_string()
            })
        );
    }
}
