//! Error taxonomy for plan execution.
//!
//! Every variant is converted into a `CheckResult` at the phase boundary;
//! none of these errors aborts a run.

use std::fmt;

/// A failure mode distinct from a probe reporting "condition not met".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// The check itself could not run (missing binary, spawn failure,
    /// command timeout).
    ProbeExecution {
        /// The probe that could not execute.
        probe_id: String,
        /// What went wrong.
        detail: String,
    },
    /// The mapped action ran but did not achieve the desired end state.
    Remediation {
        /// The action that failed.
        action_id: String,
        /// What went wrong.
        detail: String,
    },
    /// An action requires a privilege the caller does not have.
    Permission {
        /// The phase that was refused.
        phase: String,
        /// What privilege is missing.
        detail: String,
    },
    /// A phase or endpoint wait exceeded its time budget.
    DeadlineExceeded {
        /// What ran out of time.
        scope: String,
    },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProbeExecution { probe_id, detail } => {
                write!(f, "probe {probe_id} could not execute: {detail}")
            }
            Self::Remediation { action_id, detail } => {
                write!(f, "remediation {action_id} failed: {detail}")
            }
            Self::Permission { phase, detail } => {
                write!(f, "phase {phase} refused: {detail}")
            }
            Self::DeadlineExceeded { scope } => {
                write!(f, "deadline exceeded: {scope}")
            }
        }
    }
}

impl std::error::Error for RunError {}
