//! Runs a batch of orders through the saga concurrently.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use domain::{Money, Order, OrderId};
use saga::{
    CancellationToken, FulfillmentSummary, RetryPolicy, SagaExecutor, SagaStep, TerminalFailure,
};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Concurrency and deadline for one batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Maximum number of sagas in flight.
    pub concurrency: usize,
    /// Cancels every unfinished saga once elapsed.
    pub deadline: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 16,
            deadline: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderOutcome {
    Fulfilled { summary: FulfillmentSummary },
    Failed { failure: TerminalFailure },
    /// The saga task died before reporting; its progress is unknown.
    Aborted { error: String },
}

/// Result of one order's saga.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReport {
    pub order_id: OrderId,
    pub total: Money,
    /// Total above the approval threshold; reported, not enforced.
    pub requires_approval: bool,
    pub outcome: OrderOutcome,
}

impl OrderReport {
    fn new(order: &Order, result: Result<FulfillmentSummary, TerminalFailure>) -> Self {
        Self {
            order_id: order.id,
            total: order.total(),
            requires_approval: order.requires_approval(),
            outcome: match result {
                Ok(summary) => OrderOutcome::Fulfilled { summary },
                Err(failure) => OrderOutcome::Failed { failure },
            },
        }
    }

    /// Report for an order whose saga task ended without a result.
    fn aborted(order_id: OrderId, total: Money, requires_approval: bool, error: String) -> Self {
        Self {
            order_id,
            total,
            requires_approval,
            outcome: OrderOutcome::Aborted { error },
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self.outcome, OrderOutcome::Fulfilled { .. })
    }

    pub fn failure(&self) -> Option<&TerminalFailure> {
        match &self.outcome {
            OrderOutcome::Failed { failure } => Some(failure),
            OrderOutcome::Fulfilled { .. } | OrderOutcome::Aborted { .. } => None,
        }
    }
}

impl fmt::Display for OrderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order {} ({}): ", self.order_id, self.total)?;
        match &self.outcome {
            OrderOutcome::Fulfilled { summary } => write!(f, "{summary}")?,
            OrderOutcome::Failed { failure } => write!(f, "{failure}")?,
            OrderOutcome::Aborted { error } => write!(f, "saga aborted: {error}")?,
        }
        if self.requires_approval {
            write!(f, " [requires approval]")?;
        }
        Ok(())
    }
}

/// Outcome counts for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchCounts {
    pub total: usize,
    pub fulfilled: usize,
    pub permanent: usize,
    pub retries_exhausted: usize,
    pub canceled: usize,
    pub aborted: usize,
    pub requires_approval: usize,
}

/// Per-order results in submission order, plus counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub counts: BatchCounts,
    pub orders: Vec<OrderReport>,
}

impl BatchReport {
    pub fn new(orders: Vec<OrderReport>) -> Self {
        let mut counts = BatchCounts {
            total: orders.len(),
            ..BatchCounts::default()
        };
        for report in &orders {
            if report.requires_approval {
                counts.requires_approval += 1;
            }
            match &report.outcome {
                OrderOutcome::Fulfilled { .. } => counts.fulfilled += 1,
                OrderOutcome::Aborted { .. } => counts.aborted += 1,
                OrderOutcome::Failed { failure } if failure.is_canceled() => counts.canceled += 1,
                OrderOutcome::Failed { failure } if failure.is_retries_exhausted() => {
                    counts.retries_exhausted += 1
                }
                OrderOutcome::Failed { .. } => counts.permanent += 1,
            }
        }
        Self { counts, orders }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.orders {
            writeln!(f, "{report}")?;
        }
        let c = &self.counts;
        write!(
            f,
            "{} orders: {} fulfilled, {} failed permanently, {} exhausted retries, {} canceled, {} aborted, {} require approval",
            c.total,
            c.fulfilled,
            c.permanent,
            c.retries_exhausted,
            c.canceled,
            c.aborted,
            c.requires_approval
        )
    }
}

/// Executes every order, at most `options.concurrency` at a time.
///
/// Canceling `cancel`, or reaching the deadline, stops in-flight sagas and
/// reports the rest as canceled. Orders keep their submission order in the
/// report, and every submitted order appears in it: one whose task panics
/// is reported as aborted.
#[tracing::instrument(skip_all, fields(orders = orders.len(), concurrency = options.concurrency))]
pub async fn run_batch<P, I, D>(
    executor: Arc<SagaExecutor<P, I, D>>,
    orders: Vec<Order>,
    policy: &RetryPolicy,
    options: BatchOptions,
    cancel: &CancellationToken,
) -> BatchReport
where
    P: SagaStep + 'static,
    I: SagaStep + 'static,
    D: SagaStep + 'static,
{
    let batch_cancel = cancel.child_token();
    // Ends the deadline watcher with the batch.
    let _guard = batch_cancel.clone().drop_guard();

    if let Some(deadline) = options.deadline {
        let token = batch_cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep(deadline) => {
                    tracing::warn!(?deadline, "batch deadline reached, canceling in-flight sagas");
                    token.cancel();
                }
            }
        });
    }

    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut submitted = Vec::with_capacity(orders.len());
    let mut task_index = HashMap::with_capacity(orders.len());

    for (index, order) in orders.into_iter().enumerate() {
        submitted.push((order.id, order.total(), order.requires_approval()));
        let executor = executor.clone();
        let policy = policy.clone();
        let cancel = batch_cancel.clone();
        let semaphore = semaphore.clone();

        let handle = tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let result = executor.execute_with_cancel(&order, &policy, &cancel).await;
            match &result {
                Ok(_) => tracing::info!(order_id = %order.id, "order fulfilled"),
                Err(failure) => tracing::warn!(order_id = %order.id, %failure, "order not fulfilled"),
            }
            (index, OrderReport::new(&order, result))
        });
        task_index.insert(handle.id(), index);
    }

    let mut reports = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(report) => reports.push(report),
            Err(err) => {
                let Some(&index) = task_index.get(&err.id()) else {
                    tracing::error!(error = %err, "unknown saga task failed");
                    continue;
                };
                let (order_id, total, requires_approval) = submitted[index];
                tracing::error!(%order_id, error = %err, "saga task aborted");
                reports.push((
                    index,
                    OrderReport::aborted(order_id, total, requires_approval, err.to_string()),
                ));
            }
        }
    }
    reports.sort_by_key(|(index, _)| *index);

    let report = BatchReport::new(reports.into_iter().map(|(_, r)| r).collect());
    metrics::counter!("fulfill_orders_total").increment(report.counts.total as u64);
    metrics::counter!("fulfill_orders_requiring_approval")
        .increment(report.counts.requires_approval as u64);
    tracing::info!(
        fulfilled = report.counts.fulfilled,
        permanent = report.counts.permanent,
        retries_exhausted = report.counts.retries_exhausted,
        canceled = report.counts.canceled,
        aborted = report.counts.aborted,
        "batch finished"
    );
    report
}
