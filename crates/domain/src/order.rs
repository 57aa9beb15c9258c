//! Orders, their line items and payment instrument.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::money::Money;

/// Orders whose total exceeds this amount need manual approval.
pub const APPROVAL_THRESHOLD: Money = Money::from_dollars(10_000);

/// Unique identifier for an order, used to correlate log lines across steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random order ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for OrderId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Errors raised when an order does not satisfy its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Invalid quantity.
    #[error("Invalid quantity for {item_name}: {quantity} (must be greater than 0)")]
    InvalidQuantity { item_name: String, quantity: u32 },

    /// Negative unit price.
    #[error("Invalid price for {item_name}: {price} (must not be negative)")]
    NegativePrice { item_name: String, price: Money },
}

/// A line in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Name of the catalog item, matched exactly against the stock catalog.
    pub item_name: String,

    /// Price per unit.
    pub item_price: Money,

    /// Quantity ordered.
    pub quantity: u32,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(item_name: impl Into<String>, item_price: Money, quantity: u32) -> Self {
        Self {
            item_name: item_name.into(),
            item_price,
            quantity,
        }
    }

    /// Returns the total price for this line (quantity * item_price).
    pub fn total_price(&self) -> Money {
        self.item_price.multiply(self.quantity)
    }
}

/// A credit card. `expiration` is an `MM/YY` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCard {
    pub number: String,
    pub expiration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub credit_card: CreditCard,
}

impl Payment {
    /// Creates a card payment.
    pub fn card(number: impl Into<String>, expiration: impl Into<String>) -> Self {
        Self {
            credit_card: CreditCard {
                number: number.into(),
                expiration: expiration.into(),
            },
        }
    }
}

/// An order submitted for fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub id: OrderId,
    pub items: Vec<OrderItem>,
    pub payment: Payment,
}

impl Order {
    /// Creates an order with a fresh ID, validating its items.
    pub fn new(items: Vec<OrderItem>, payment: Payment) -> Result<Self, OrderError> {
        let order = Self {
            id: OrderId::new(),
            items,
            payment,
        };
        order.validate()?;
        Ok(order)
    }

    /// Checks that the order has at least one item and every line is well formed.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::NoItems);
        }
        for item in &self.items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    item_name: item.item_name.clone(),
                    quantity: item.quantity,
                });
            }
            if item.item_price.is_negative() {
                return Err(OrderError::NegativePrice {
                    item_name: item.item_name.clone(),
                    price: item.item_price,
                });
            }
        }
        Ok(())
    }

    /// Returns the number of order lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the sum of all line totals.
    pub fn total(&self) -> Money {
        self.items.iter().map(OrderItem::total_price).sum()
    }

    /// Returns true if the order total is above [`APPROVAL_THRESHOLD`].
    pub fn requires_approval(&self) -> bool {
        self.total() > APPROVAL_THRESHOLD
    }

    /// Returns the card expiration as `MM/YY`.
    pub fn card_expiration(&self) -> &str {
        &self.payment.credit_card.expiration
    }
}
