//! Saga executor: drives the steps in order with retries, timeouts and cancellation.

use std::collections::HashMap;

use domain::Order;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{StepFailure, TerminalFailure, TerminalReason};
use crate::events::SagaEvent;
use crate::order_fulfillment;
use crate::outcome::{FulfillmentSummary, StepOutcome};
use crate::policy::RetryPolicy;
use crate::run::SagaRun;
use crate::steps::SagaStep;

/// Runs the payment, inventory and delivery steps of one order, in that order.
///
/// A step only starts once its predecessor succeeded. Each attempt runs under
/// the policy's per-attempt timeout; retryable failures are retried with
/// backoff until the policy's limits, permanent failures stop the saga at
/// once. The executor keeps no state between calls, so one instance can drive
/// any number of orders concurrently.
pub struct SagaExecutor<P, I, D>
where
    P: SagaStep,
    I: SagaStep,
    D: SagaStep,
{
    payment: P,
    inventory: I,
    delivery: D,
    step_policies: HashMap<&'static str, RetryPolicy>,
}

/// How a single step ended when it did not succeed.
struct StepHalt {
    reason: TerminalReason,
    attempts: u32,
}

impl<P, I, D> SagaExecutor<P, I, D>
where
    P: SagaStep,
    I: SagaStep,
    D: SagaStep,
{
    /// Creates a new saga executor.
    pub fn new(payment: P, inventory: I, delivery: D) -> Self {
        Self {
            payment,
            inventory,
            delivery,
            step_policies: HashMap::new(),
        }
    }

    /// Uses `policy` for the named step instead of the policy passed to `execute`.
    pub fn with_step_policy(mut self, step: &'static str, policy: RetryPolicy) -> Self {
        self.step_policies.insert(step, policy);
        self
    }

    /// Executes the saga for an order.
    pub async fn execute(
        &self,
        order: &Order,
        policy: &RetryPolicy,
    ) -> Result<FulfillmentSummary, TerminalFailure> {
        self.execute_with_cancel(order, policy, &CancellationToken::new())
            .await
    }

    /// Executes the saga, stopping with a canceled failure once `cancel` fires.
    pub async fn execute_with_cancel(
        &self,
        order: &Order,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<FulfillmentSummary, TerminalFailure> {
        self.run(order, policy, cancel).await.into_result()
    }

    /// Executes the saga and returns the full run record.
    #[tracing::instrument(
        skip_all,
        fields(
            saga_type = order_fulfillment::SAGA_TYPE,
            order_id = %order.id,
            run_id = tracing::field::Empty
        )
    )]
    pub async fn run(
        &self,
        order: &Order,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> SagaRun {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = Instant::now();

        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        let mut run = SagaRun::default();
        run.apply(SagaEvent::run_started(
            run_id,
            order.id,
            order_fulfillment::SAGA_TYPE,
        ));

        let steps: [&dyn SagaStep; 3] = [&self.payment, &self.inventory, &self.delivery];
        for step in steps {
            let step_policy = self.step_policies.get(step.name()).unwrap_or(policy);
            if let Err(halt) = self
                .drive_step(step, order, step_policy, cancel, &mut run)
                .await
            {
                let reason_label = halt.reason.as_str();
                tracing::warn!(
                    step = step.name(),
                    attempts = halt.attempts,
                    reason = %halt.reason,
                    "saga failed"
                );
                run.apply(SagaEvent::run_failed(step.name(), halt.reason, halt.attempts));
                metrics::counter!("saga_failed", "reason" => reason_label).increment(1);
                metrics::histogram!("saga_duration_seconds")
                    .record(saga_start.elapsed().as_secs_f64());
                return run;
            }
        }

        run.apply(SagaEvent::run_completed());

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);
        metrics::counter!("saga_completed").increment(1);
        tracing::info!(duration, "saga completed successfully");

        run
    }

    /// Runs one step to success or to a terminal halt, recording events on `run`.
    async fn drive_step(
        &self,
        step: &dyn SagaStep,
        order: &Order,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
        run: &mut SagaRun,
    ) -> Result<(), StepHalt> {
        let name = step.name();
        tracing::info!(step = name, "saga step started");
        run.apply(SagaEvent::step_started(name));

        let step_start = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            metrics::counter!("saga_step_attempts_total", "step" => name).increment(1);

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    return Err(StepHalt { reason: TerminalReason::Canceled, attempts: attempt });
                }
                outcome = attempt_with_timeout(step, order, policy) => outcome,
            };

            let failure = match outcome {
                StepOutcome::Success(message) => {
                    tracing::info!(step = name, attempts = attempt, "saga step completed");
                    run.apply(SagaEvent::step_completed(name, message, attempt));
                    return Ok(());
                }
                StepOutcome::PermanentFailure(failure) => {
                    return Err(halt(run, name, attempt, TerminalReason::Permanent(failure)));
                }
                StepOutcome::RetryableFailure(failure) => failure,
            };

            if !policy.is_retryable(failure.kind()) {
                return Err(halt(run, name, attempt, TerminalReason::Permanent(failure)));
            }

            let wait = policy.backoff_for(attempt);
            if policy.attempts_exhausted(attempt)
                || policy.exceeds_elapsed_after(step_start.elapsed(), wait)
            {
                return Err(halt(
                    run,
                    name,
                    attempt,
                    TerminalReason::RetriesExhausted(failure),
                ));
            }

            tracing::warn!(
                step = name,
                attempt,
                error = %failure,
                retry_in = ?wait,
                "saga step attempt failed, retrying"
            );
            run.apply(SagaEvent::attempt_failed(name, attempt, failure, Some(wait)));

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    return Err(StepHalt { reason: TerminalReason::Canceled, attempts: attempt });
                }
                () = tokio::time::sleep(wait) => {}
            }
        }
    }
}

/// Runs one attempt; an attempt that outlives the timeout is a retryable failure.
async fn attempt_with_timeout(
    step: &dyn SagaStep,
    order: &Order,
    policy: &RetryPolicy,
) -> StepOutcome {
    let timeout = policy.attempt_timeout();
    match tokio::time::timeout(timeout, step.execute(order)).await {
        Ok(outcome) => outcome,
        Err(_) => StepOutcome::RetryableFailure(StepFailure::AttemptTimeout { timeout }),
    }
}

/// Records the final failed attempt and builds the halt.
fn halt(run: &mut SagaRun, step: &str, attempt: u32, reason: TerminalReason) -> StepHalt {
    if let Some(failure) = reason.failure() {
        run.apply(SagaEvent::attempt_failed(step, attempt, failure.clone(), None));
    }
    StepHalt {
        reason,
        attempts: attempt,
    }
}
