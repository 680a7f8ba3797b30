//! Orchestrator lifecycle state machine:
//! `initializing -> ready -> shutting-down -> shutdown`, any state may
//! move to `error` on a fatal failure.

use std::sync::Mutex;

use crate::error::OrchestratorError;

/// A lifecycle state of the [`crate::Orchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrchestratorState {
    /// Constructed but not yet accepting operations.
    Initializing,
    /// Accepting new operations.
    Ready,
    /// Draining in-flight operations; new operations are rejected.
    ShuttingDown,
    /// Fully drained; the orchestrator is inert.
    Shutdown,
    /// A fatal error occurred; the orchestrator is inert.
    Error,
}

/// Validates and tracks transitions through [`OrchestratorState`].
pub struct StateMachine(Mutex<OrchestratorState>);

impl StateMachine {
    /// A fresh state machine, starting in [`OrchestratorState::Initializing`].
    pub fn new() -> Self {
        Self(Mutex::new(OrchestratorState::Initializing))
    }

    /// The current state.
    pub fn current(&self) -> OrchestratorState {
        *self.0.lock().expect("orchestrator state lock poisoned")
    }

    /// Attempt to move to `to`. Any state may move to `Error`; otherwise
    /// only the forward transitions along the lifecycle are allowed.
    pub fn transition(&self, to: OrchestratorState) -> Result<(), OrchestratorError> {
        use OrchestratorState::{Error, Initializing, Ready, Shutdown, ShuttingDown};

        let mut guard = self.0.lock().expect("orchestrator state lock poisoned");
        let from = *guard;
        let allowed = to == Error
            || matches!(
                (from, to),
                (Initializing, Ready) | (Ready, ShuttingDown) | (ShuttingDown, Shutdown)
            );
        if !allowed {
            return Err(OrchestratorError::InvalidTransition { from, to });
        }
        *guard = to;
        Ok(())
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
