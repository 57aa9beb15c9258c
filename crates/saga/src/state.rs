//! Lifecycle of a saga run.

use serde::{Deserialize, Serialize};

use crate::error::TerminalReason;

/// Where a [`SagaRun`](crate::run::SagaRun) is in its lifecycle.
///
/// ```text
/// NotStarted ──► Running ──┬──► Completed
///                          ├──► Failed     (permanent or retries exhausted)
///                          └──► Canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SagaState {
    #[default]
    NotStarted,
    Running,
    Completed,
    Failed,
    Canceled,
}

impl SagaState {
    /// Terminal state for a run that stopped with `reason`.
    pub fn halted_by(reason: &TerminalReason) -> Self {
        match reason {
            TerminalReason::Canceled => SagaState::Canceled,
            TerminalReason::Permanent(_) | TerminalReason::RetriesExhausted(_) => {
                SagaState::Failed
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaState::Completed | SagaState::Failed | SagaState::Canceled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::NotStarted => "not_started",
            SagaState::Running => "running",
            SagaState::Completed => "completed",
            SagaState::Failed => "failed",
            SagaState::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
