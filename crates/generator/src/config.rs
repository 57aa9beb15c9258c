//! Batch shape: how many orders and which fractions receive each fault.

use crate::error::{GeneratorError, Result};

/// Describes one generated batch.
///
/// Percentages apply to `num_orders` with floor rounding: 20% of 7 orders
/// selects 1 order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub num_orders: usize,
    /// Orders whose first item name gets the malformation marker.
    pub invalid_percentage: u32,
    /// Orders scaled up past the approval threshold.
    pub expensive_percentage: u32,
    /// Orders whose card is set to the expired sentinel.
    pub expired_card_percentage: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(1)
    }
}

impl GeneratorConfig {
    /// A batch of `num_orders` clean orders.
    pub fn new(num_orders: usize) -> Self {
        Self {
            num_orders,
            invalid_percentage: 0,
            expensive_percentage: 0,
            expired_card_percentage: 0,
        }
    }

    pub fn with_invalid_percentage(mut self, pct: u32) -> Self {
        self.invalid_percentage = pct;
        self
    }

    pub fn with_expensive_percentage(mut self, pct: u32) -> Self {
        self.expensive_percentage = pct;
        self
    }

    pub fn with_expired_card_percentage(mut self, pct: u32) -> Self {
        self.expired_card_percentage = pct;
        self
    }

    /// Rejects percentages above 100.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("invalid_percentage", self.invalid_percentage),
            ("expensive_percentage", self.expensive_percentage),
            ("expired_card_percentage", self.expired_card_percentage),
        ] {
            if value > 100 {
                return Err(GeneratorError::PercentageOutOfRange { field, value });
            }
        }
        Ok(())
    }

    pub fn invalid_count(&self) -> usize {
        selection_size(self.num_orders, self.invalid_percentage)
    }

    pub fn expensive_count(&self) -> usize {
        selection_size(self.num_orders, self.expensive_percentage)
    }

    pub fn expired_card_count(&self) -> usize {
        selection_size(self.num_orders, self.expired_card_percentage)
    }
}

/// `floor(pct / 100 * count)`, computed in integers.
fn selection_size(count: usize, pct: u32) -> usize {
    count.saturating_mul(pct as usize) / 100
}
