//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use generator::GeneratorConfig;

use crate::config::Config;

/// Generate a batch of orders and drive each through the fulfillment saga.
#[derive(Debug, Clone, Parser)]
#[command(name = "fulfill", version, about)]
pub struct Args {
    /// Number of orders to generate.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub num_orders: usize,

    /// Percentage of orders with a malformed first item name.
    #[arg(short = 'i', long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub invalid_percentage: u32,

    /// Percentage of orders scaled past the approval threshold.
    #[arg(short = 'e', long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub expensive_percentage: u32,

    /// Percentage of orders paid with an expired card.
    #[arg(short = 'E', long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub expired_card_percentage: u32,

    /// Seed for a reproducible batch.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum number of sagas in flight.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u32).range(1..))]
    pub concurrency: u32,

    /// Cancel every unfinished saga after this many seconds.
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Attempts per step; 0 removes the limit. Overrides SAGA_MAX_ATTEMPTS.
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Stock database JSON file. Overrides STOCK_DATABASE_PATH.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Directory holding the inventory flag files. Overrides FLAGS_DIR.
    #[arg(long)]
    pub flags_dir: Option<PathBuf>,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Print Prometheus metrics after the batch.
    #[arg(long)]
    pub print_metrics: bool,
}

impl Args {
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::new(self.num_orders)
            .with_invalid_percentage(self.invalid_percentage)
            .with_expensive_percentage(self.expensive_percentage)
            .with_expired_card_percentage(self.expired_card_percentage)
    }

    /// Applies command-line overrides on top of environment configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.catalog {
            config.stock_database_path = path.clone();
        }
        if let Some(dir) = &self.flags_dir {
            config.flags_dir = dir.clone();
        }
        if let Some(attempts) = self.max_attempts {
            config.max_attempts = (attempts > 0).then_some(attempts);
        }
    }
}
