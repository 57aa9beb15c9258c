//! Record of a single saga execution.

use domain::OrderId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TerminalFailure, TerminalReason};
use crate::events::SagaEvent;
use crate::outcome::{CompletedStep, FulfillmentSummary};
use crate::state::SagaState;

/// One execution of the saga against one order.
///
/// Built by applying [`SagaEvent`]s in order; the executor owns it while the
/// saga runs and hands it to the caller afterwards. Applying events is pure:
/// the same events always produce the same record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SagaRun {
    id: Option<Uuid>,
    order_id: Option<OrderId>,
    saga_type: String,
    state: SagaState,
    current_step: Option<String>,
    /// Attempts made on the current step so far.
    current_attempts: u32,
    completed_steps: Vec<CompletedStep>,
    failure: Option<TerminalFailure>,
    history: Vec<SagaEvent>,
}

impl SagaRun {
    /// Applies an event, updating the record.
    pub fn apply(&mut self, event: SagaEvent) {
        match &event {
            SagaEvent::RunStarted(data) => {
                self.id = Some(data.run_id);
                self.order_id = Some(data.order_id);
                self.saga_type = data.saga_type.clone();
                self.state = SagaState::Running;
            }
            SagaEvent::StepStarted(data) => {
                self.current_step = Some(data.step_name.clone());
                self.current_attempts = 0;
            }
            SagaEvent::AttemptFailed(data) => {
                self.current_attempts = data.attempt;
            }
            SagaEvent::StepCompleted(data) => {
                self.completed_steps.push(CompletedStep {
                    step: data.step_name.clone(),
                    message: data.message.clone(),
                    attempts: data.attempts,
                });
                self.current_step = None;
                self.current_attempts = 0;
            }
            SagaEvent::RunCompleted(_) => {
                self.state = SagaState::Completed;
            }
            SagaEvent::RunFailed(data) => {
                self.state = SagaState::halted_by(&data.reason);
                self.current_attempts = data.attempts;
                self.failure = Some(TerminalFailure {
                    step: data.step_name.clone(),
                    reason: data.reason.clone(),
                    attempts: data.attempts,
                    completed: self.completed_steps.clone(),
                });
            }
        }
        self.history.push(event);
    }

    /// Applies multiple events in sequence.
    pub fn apply_events(&mut self, events: impl IntoIterator<Item = SagaEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Converts a finished run into the saga's result.
    ///
    /// A run that never reached a terminal state is reported as canceled at
    /// the step it was on.
    pub fn into_result(self) -> Result<FulfillmentSummary, TerminalFailure> {
        match self.state {
            SagaState::Completed => Ok(FulfillmentSummary::from_steps(&self.completed_steps)),
            _ => Err(self.failure.unwrap_or_else(|| TerminalFailure {
                step: self.current_step.unwrap_or_default(),
                reason: TerminalReason::Canceled,
                attempts: self.current_attempts,
                completed: self.completed_steps,
            })),
        }
    }
}

// Query methods
impl SagaRun {
    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn saga_type(&self) -> &str {
        &self.saga_type
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Returns the step in progress, if any.
    pub fn current_step(&self) -> Option<&str> {
        self.current_step.as_deref()
    }

    pub fn completed_steps(&self) -> &[CompletedStep] {
        &self.completed_steps
    }

    /// Returns the terminal failure, if the run failed or was canceled.
    pub fn failure(&self) -> Option<&TerminalFailure> {
        self.failure.as_ref()
    }

    /// Returns every event applied so far, in order.
    pub fn history(&self) -> &[SagaEvent] {
        &self.history
    }

    /// Returns the number of attempts made on a step, or 0 if it never started.
    pub fn attempts_for(&self, step: &str) -> u32 {
        self.history
            .iter()
            .filter_map(|event| match event {
                SagaEvent::AttemptFailed(data) if data.step_name == step => Some(data.attempt),
                SagaEvent::StepCompleted(data) if data.step_name == step => Some(data.attempts),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StepFailure;
    use crate::order_fulfillment::{
        SAGA_TYPE, STEP_DELIVER_ORDER, STEP_PROCESS_PAYMENT, STEP_RESERVE_INVENTORY,
    };
    use std::time::Duration;

    fn started() -> SagaRun {
        let mut run = SagaRun::default();
        run.apply(SagaEvent::run_started(Uuid::new_v4(), OrderId::new(), SAGA_TYPE));
        run
    }

    fn unavailable() -> StepFailure {
        StepFailure::ServiceUnavailable {
            service: "inventory".into(),
        }
    }

    #[test]
    fn test_default_run() {
        let run = SagaRun::default();
        assert!(run.id().is_none());
        assert_eq!(run.state(), SagaState::NotStarted);
        assert!(run.completed_steps().is_empty());
    }

    #[test]
    fn test_apply_run_started() {
        let run = started();
        assert!(run.id().is_some());
        assert!(run.order_id().is_some());
        assert_eq!(run.saga_type(), SAGA_TYPE);
        assert_eq!(run.state(), SagaState::Running);
    }

    #[test]
    fn test_completed_run_yields_summary() {
        let mut run = started();
        for (step, message) in [
            (STEP_PROCESS_PAYMENT, "Payment processed for 1 items."),
            (STEP_RESERVE_INVENTORY, "Inventory reserved for 1 items."),
            (STEP_DELIVER_ORDER, "Order delivered for 1 items."),
        ] {
            run.apply(SagaEvent::step_started(step));
            assert_eq!(run.current_step(), Some(step));
            run.apply(SagaEvent::step_completed(step, message, 1));
        }
        run.apply(SagaEvent::run_completed());

        assert_eq!(run.state(), SagaState::Completed);
        assert_eq!(run.history().len(), 8);
        let summary = run.into_result().unwrap();
        assert_eq!(summary.messages().count(), 3);
    }

    #[test]
    fn test_failed_run_keeps_partial_progress() {
        let mut run = started();
        run.apply(SagaEvent::step_started(STEP_PROCESS_PAYMENT));
        run.apply(SagaEvent::step_completed(
            STEP_PROCESS_PAYMENT,
            "Payment processed for 2 items.",
            1,
        ));
        run.apply(SagaEvent::step_started(STEP_RESERVE_INVENTORY));
        run.apply(SagaEvent::attempt_failed(
            STEP_RESERVE_INVENTORY,
            1,
            unavailable(),
            Some(Duration::from_secs(1)),
        ));
        run.apply(SagaEvent::attempt_failed(
            STEP_RESERVE_INVENTORY,
            2,
            unavailable(),
            None,
        ));
        run.apply(SagaEvent::run_failed(
            STEP_RESERVE_INVENTORY,
            TerminalReason::RetriesExhausted(unavailable()),
            2,
        ));

        assert_eq!(run.state(), SagaState::Failed);
        assert_eq!(run.attempts_for(STEP_RESERVE_INVENTORY), 2);
        assert_eq!(run.attempts_for(STEP_PROCESS_PAYMENT), 1);
        assert_eq!(run.attempts_for(STEP_DELIVER_ORDER), 0);

        let failure = run.into_result().unwrap_err();
        assert_eq!(failure.step, STEP_RESERVE_INVENTORY);
        assert!(failure.is_retries_exhausted());
        assert_eq!(failure.completed.len(), 1);
        assert_eq!(failure.completed[0].step, STEP_PROCESS_PAYMENT);
    }

    #[test]
    fn test_canceled_run_state() {
        let mut run = started();
        run.apply(SagaEvent::step_started(STEP_PROCESS_PAYMENT));
        run.apply(SagaEvent::run_failed(
            STEP_PROCESS_PAYMENT,
            TerminalReason::Canceled,
            1,
        ));
        assert_eq!(run.state(), SagaState::Canceled);
        assert!(run.failure().unwrap().is_canceled());
    }

    #[test]
    fn test_unfinished_run_reports_canceled_at_cursor() {
        let mut run = started();
        run.apply(SagaEvent::step_started(STEP_RESERVE_INVENTORY));
        let failure = run.into_result().unwrap_err();
        assert_eq!(failure.step, STEP_RESERVE_INVENTORY);
        assert!(failure.is_canceled());
    }
}
