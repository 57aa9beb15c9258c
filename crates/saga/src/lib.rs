//! Saga execution core for order fulfillment.
//!
//! The order fulfillment saga runs these steps strictly in order:
//! 1. Process payment
//! 2. Reserve inventory
//! 3. Deliver order
//!
//! Every attempt runs under a per-attempt timeout. Retryable failures are
//! retried with bounded exponential backoff according to a [`RetryPolicy`];
//! permanent failures stop the saga immediately. Waits are cancellable
//! through a `CancellationToken`. Durability and replay belong to the
//! orchestration engine that calls into this crate.

pub mod error;
pub mod events;
pub mod executor;
pub mod flags;
pub mod order_fulfillment;
pub mod outcome;
pub mod policy;
pub mod run;
pub mod state;
pub mod steps;

pub use error::{FailureKind, SagaError, StepFailure, TerminalFailure, TerminalReason};
pub use events::SagaEvent;
pub use executor::SagaExecutor;
pub use flags::{FeatureFlags, FileFlags, StaticFlags};
pub use order_fulfillment::OrderFulfillmentExecutor;
pub use outcome::{CompletedStep, FulfillmentSummary, StepOutcome};
pub use policy::{RetryPolicy, RetryPolicyBuilder};
pub use run::SagaRun;
pub use state::SagaState;
pub use steps::{DeliveryStep, InventoryStep, PaymentStep, SagaStep, normalize_item_name};
pub use tokio_util::sync::CancellationToken;
