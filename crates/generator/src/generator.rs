//! Order batch generation with fault injection.

use domain::{APPROVAL_THRESHOLD, Order, OrderId, OrderItem, Payment, StockCatalog};
use rand::rngs::StdRng;
use rand::seq::{SliceRandom, index};
use rand::{Rng, SeedableRng};
use saga::order_fulfillment::{EXPIRED_CARD_SENTINEL, MALFORMED_ITEM_SUFFIX};

use crate::config::GeneratorConfig;
use crate::error::{GeneratorError, Result};

/// Card number on every generated order.
pub const DEFAULT_CARD_NUMBER: &str = "1234 5678 1234 5678";

/// Card expiration on every generated order before the expired fault applies.
pub const DEFAULT_CARD_EXPIRATION: &str = "12/25";

/// Draws orders from a catalog.
///
/// Every random choice, including order IDs, comes from `R`, so a seeded
/// generator reproduces the same batch.
pub struct OrderGenerator<'a, R> {
    catalog: &'a StockCatalog,
    rng: R,
}

impl<'a> OrderGenerator<'a, StdRng> {
    /// A generator whose batches are reproducible from `seed`.
    pub fn seeded(catalog: &'a StockCatalog, seed: u64) -> Self {
        Self::new(catalog, StdRng::seed_from_u64(seed))
    }

    /// A generator seeded from the operating system.
    pub fn from_entropy(catalog: &'a StockCatalog) -> Self {
        Self::new(catalog, StdRng::from_entropy())
    }
}

impl<'a, R: Rng> OrderGenerator<'a, R> {
    pub fn new(catalog: &'a StockCatalog, rng: R) -> Self {
        Self { catalog, rng }
    }

    /// Builds a batch, then applies each fault to its own random selection.
    ///
    /// Selections are drawn independently, so one order may receive several
    /// faults.
    pub fn generate(&mut self, config: &GeneratorConfig) -> Result<Vec<Order>> {
        config.validate()?;
        if config.num_orders == 0 {
            return Ok(Vec::new());
        }
        if self.catalog.is_empty() {
            return Err(GeneratorError::EmptyCatalog);
        }

        let mut orders = (0..config.num_orders)
            .map(|_| self.random_order())
            .collect::<Result<Vec<_>>>()?;

        for index in self.pick(config.num_orders, config.invalid_count()) {
            let item = &mut orders[index].items[0];
            item.item_name.push_str(MALFORMED_ITEM_SUFFIX);
        }

        for index in self.pick(config.num_orders, config.expensive_count()) {
            self.make_expensive(&mut orders[index], index)?;
        }

        for index in self.pick(config.num_orders, config.expired_card_count()) {
            orders[index].payment.credit_card.expiration = EXPIRED_CARD_SENTINEL.to_string();
        }

        tracing::debug!(
            orders = orders.len(),
            invalid = config.invalid_count(),
            expensive = config.expensive_count(),
            expired_cards = config.expired_card_count(),
            "generated order batch"
        );

        Ok(orders)
    }

    fn random_order(&mut self) -> Result<Order> {
        let num_items = self.rng.gen_range(1..=3);
        let mut items = Vec::with_capacity(num_items);
        for _ in 0..num_items {
            // Non-empty catalog is checked by the caller.
            if let Some(stock) = self.catalog.items().choose(&mut self.rng) {
                let quantity = self.rng.gen_range(1..=3);
                items.push(OrderItem::new(
                    stock.item_name.clone(),
                    stock.item_price,
                    quantity,
                ));
            }
        }

        let mut order = Order::new(
            items,
            Payment::card(DEFAULT_CARD_NUMBER, DEFAULT_CARD_EXPIRATION),
        )?;
        order.id = OrderId::from(uuid::Builder::from_random_bytes(self.rng.r#gen()).into_uuid());
        Ok(order)
    }

    /// Distinct indices chosen uniformly from `0..len`.
    fn pick(&mut self, len: usize, amount: usize) -> Vec<usize> {
        index::sample(&mut self.rng, len, amount.min(len)).into_vec()
    }

    fn make_expensive(&mut self, order: &mut Order, index: usize) -> Result<()> {
        if order.items.iter().all(|item| item.item_price.is_zero()) {
            return Err(GeneratorError::UnboundedExpensiveOrder { index });
        }
        while order.total() <= APPROVAL_THRESHOLD {
            for item in &mut order.items {
                item.quantity = item.quantity.saturating_add(self.rng.gen_range(1..=3));
            }
        }
        Ok(())
    }
}

/// Generates a batch with a fresh entropy-seeded generator.
pub fn generate(catalog: &StockCatalog, config: &GeneratorConfig) -> Result<Vec<Order>> {
    OrderGenerator::from_entropy(catalog).generate(config)
}
