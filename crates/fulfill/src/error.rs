//! Runner error types.

use domain::DomainError;
use generator::GeneratorError;
use saga::SagaError;
use thiserror::Error;

/// Errors that stop the runner before or around a batch.
///
/// Saga failures are outcomes, not errors: they are collected in the report.
#[derive(Debug, Error)]
pub enum CliError {
    /// Loading the stock catalog failed.
    #[error("Failed to load stock catalog: {0}")]
    Catalog(#[from] DomainError),

    /// Order generation failed.
    #[error("Failed to generate orders: {0}")]
    Generator(#[from] GeneratorError),

    /// Retry policy configuration is invalid.
    #[error(transparent)]
    Saga(#[from] SagaError),

    /// Telemetry could not be installed.
    #[error("Failed to initialize telemetry: {0}")]
    Telemetry(String),

    /// Report serialization failed.
    #[error("Failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}
