//! Synthetic order batches for exercising the fulfillment saga.
//!
//! Orders draw 1-3 random catalog items with quantities 1-3. Configurable
//! fractions of a batch then receive injected faults:
//! - a malformed first item name, failing inventory lookup
//! - quantities scaled past the approval threshold
//! - an expired card, failing payment permanently

pub mod config;
pub mod error;
pub mod generator;

pub use config::GeneratorConfig;
pub use error::GeneratorError;
pub use generator::{DEFAULT_CARD_EXPIRATION, DEFAULT_CARD_NUMBER, OrderGenerator, generate};
