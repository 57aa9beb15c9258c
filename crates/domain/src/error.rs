//! Domain error types.

use thiserror::Error;

use crate::order::OrderError;
use crate::stock::CatalogError;

/// Errors that can occur while building or loading domain data.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An order failed validation.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// The stock catalog is inconsistent.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Reading a data file failed.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
