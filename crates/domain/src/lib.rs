//! Domain types for the order fulfillment saga.
//!
//! This crate provides:
//! - `Money` amounts stored as integer cents
//! - `Order`, its items and payment instrument
//! - The read-only `StockCatalog` the inventory step validates against

pub mod error;
pub mod money;
pub mod order;
pub mod stock;

pub use error::DomainError;
pub use money::Money;
pub use order::{
    APPROVAL_THRESHOLD, CreditCard, Order, OrderError, OrderId, OrderItem, Payment,
};
pub use stock::{CatalogError, StockCatalog, StockItem};
