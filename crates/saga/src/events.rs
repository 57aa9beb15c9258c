//! Events recorded while a saga runs.

use std::time::Duration;

use chrono::{DateTime, Utc};
use domain::OrderId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{StepFailure, TerminalReason};

/// Events that can occur during saga execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SagaEvent {
    /// Saga execution started.
    RunStarted(RunStartedData),

    /// A saga step started execution.
    StepStarted(StepData),

    /// An attempt of a step failed.
    AttemptFailed(AttemptFailedData),

    /// A saga step completed successfully.
    StepCompleted(StepCompletedData),

    /// Every step completed.
    RunCompleted(RunCompletedData),

    /// The saga stopped at a step without completing.
    RunFailed(RunFailedData),
}

impl SagaEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            SagaEvent::RunStarted(_) => "RunStarted",
            SagaEvent::StepStarted(_) => "StepStarted",
            SagaEvent::AttemptFailed(_) => "AttemptFailed",
            SagaEvent::StepCompleted(_) => "StepCompleted",
            SagaEvent::RunCompleted(_) => "RunCompleted",
            SagaEvent::RunFailed(_) => "RunFailed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStartedData {
    pub run_id: Uuid,
    pub order_id: OrderId,
    /// The type of saga (e.g., "OrderFulfillment").
    pub saga_type: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepData {
    pub step_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptFailedData {
    pub step_name: String,
    /// 1-based attempt number.
    pub attempt: u32,
    pub failure: StepFailure,
    /// Backoff before the next attempt; `None` when no retry follows.
    pub retry_in: Option<Duration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepCompletedData {
    pub step_name: String,
    pub message: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCompletedData {
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFailedData {
    pub step_name: String,
    pub reason: TerminalReason,
    pub attempts: u32,
    pub failed_at: DateTime<Utc>,
}

// Convenience constructors
impl SagaEvent {
    pub fn run_started(run_id: Uuid, order_id: OrderId, saga_type: impl Into<String>) -> Self {
        SagaEvent::RunStarted(RunStartedData {
            run_id,
            order_id,
            saga_type: saga_type.into(),
            started_at: Utc::now(),
        })
    }

    pub fn step_started(step_name: impl Into<String>) -> Self {
        SagaEvent::StepStarted(StepData {
            step_name: step_name.into(),
        })
    }

    pub fn attempt_failed(
        step_name: impl Into<String>,
        attempt: u32,
        failure: StepFailure,
        retry_in: Option<Duration>,
    ) -> Self {
        SagaEvent::AttemptFailed(AttemptFailedData {
            step_name: step_name.into(),
            attempt,
            failure,
            retry_in,
        })
    }

    pub fn step_completed(
        step_name: impl Into<String>,
        message: impl Into<String>,
        attempts: u32,
    ) -> Self {
        SagaEvent::StepCompleted(StepCompletedData {
            step_name: step_name.into(),
            message: message.into(),
            attempts,
        })
    }

    pub fn run_completed() -> Self {
        SagaEvent::RunCompleted(RunCompletedData {
            completed_at: Utc::now(),
        })
    }

    pub fn run_failed(step_name: impl Into<String>, reason: TerminalReason, attempts: u32) -> Self {
        SagaEvent::RunFailed(RunFailedData {
            step_name: step_name.into(),
            reason,
            attempts,
            failed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let failure = StepFailure::ServiceUnavailable {
            service: "inventory".into(),
        };
        assert_eq!(
            SagaEvent::run_started(Uuid::new_v4(), OrderId::new(), "OrderFulfillment")
                .event_type(),
            "RunStarted"
        );
        assert_eq!(
            SagaEvent::step_started("reserve_inventory").event_type(),
            "StepStarted"
        );
        assert_eq!(
            SagaEvent::attempt_failed("reserve_inventory", 1, failure.clone(), None).event_type(),
            "AttemptFailed"
        );
        assert_eq!(
            SagaEvent::step_completed("reserve_inventory", "ok", 1).event_type(),
            "StepCompleted"
        );
        assert_eq!(SagaEvent::run_completed().event_type(), "RunCompleted");
        assert_eq!(
            SagaEvent::run_failed(
                "reserve_inventory",
                TerminalReason::RetriesExhausted(failure),
                5
            )
            .event_type(),
            "RunFailed"
        );
    }

    #[test]
    fn test_attempt_failed_json() {
        let event = SagaEvent::attempt_failed(
            "reserve_inventory",
            2,
            StepFailure::AttemptTimeout {
                timeout: Duration::from_secs(5),
            },
            Some(Duration::from_secs(2)),
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "AttemptFailed");
        assert_eq!(json["data"]["attempt"], 2);
        assert_eq!(json["data"]["failure"]["kind"], "AttemptTimeout");

        let parsed: SagaEvent = serde_json::from_value(json).unwrap();
        if let SagaEvent::AttemptFailed(data) = parsed {
            assert_eq!(data.retry_in, Some(Duration::from_secs(2)));
        } else {
            panic!("Expected AttemptFailed event");
        }
    }
}
