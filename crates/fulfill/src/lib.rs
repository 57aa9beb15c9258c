//! Batch runner for the order fulfillment saga.
//!
//! Loads the stock catalog, generates a batch of orders with injected
//! faults and drives every order through the saga concurrently, with
//! structured logging (tracing) and Prometheus metrics.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use domain::StockCatalog;
use generator::OrderGenerator;
use saga::{CancellationToken, FileFlags, order_fulfillment};

pub use batch::{BatchCounts, BatchOptions, BatchReport, OrderOutcome, OrderReport, run_batch};
pub use cli::Args;
pub use config::{Config, LogFormat};
pub use error::CliError;

/// Loads the catalog, generates the batch described by `args` and runs it.
pub async fn run(
    args: &Args,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<BatchReport, CliError> {
    let catalog = Arc::new(StockCatalog::load(&config.stock_database_path).await?);
    tracing::info!(
        path = %config.stock_database_path.display(),
        items = catalog.len(),
        "loaded stock catalog"
    );

    let mut generator = match args.seed {
        Some(seed) => OrderGenerator::seeded(&catalog, seed),
        None => OrderGenerator::from_entropy(&catalog),
    };
    let orders = generator.generate(&args.generator_config())?;

    let policy = config.retry_policy()?;
    let flags = Arc::new(FileFlags::new(config.flags_dir.clone()));
    let executor = Arc::new(order_fulfillment::executor(catalog.clone(), flags));

    let options = BatchOptions {
        concurrency: args.concurrency as usize,
        deadline: args.deadline_secs.map(Duration::from_secs),
    };
    Ok(run_batch(executor, orders, &policy, options, cancel).await)
}
