//! Generator error types.

use domain::OrderError;
use thiserror::Error;

/// Errors raised while building an order batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    /// A fault percentage is outside 0..=100.
    #[error("{field} must be between 0 and 100, got {value}")]
    PercentageOutOfRange { field: &'static str, value: u32 },

    /// Orders were requested but the catalog has nothing to draw from.
    #[error("Cannot generate orders from an empty stock catalog")]
    EmptyCatalog,

    /// An order picked as expensive has no priced items, so its total cannot grow.
    #[error("Order {index} cannot exceed the approval threshold: every item is free")]
    UnboundedExpensiveOrder { index: usize },

    /// A generated order failed validation.
    #[error(transparent)]
    InvalidOrder(#[from] OrderError),
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
