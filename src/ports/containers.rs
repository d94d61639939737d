//! Container orchestrator port.
//!
//! The orchestrator (Docker Compose in the live adapter) is treated as an
//! opaque remote service with its own locking; this port only asks about
//! and converges on the declared container set.

use serde::{Deserialize, Serialize};

use super::PortError;

/// Observed state of a single named container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    /// The container exists and is running.
    Up,
    /// The container exists but is stopped, or does not exist.
    Down,
    /// The orchestrator could not tell (daemon unreachable, parse failure).
    Unknown,
}

/// One row of a `ps`-style container listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// Container name.
    pub name: String,
    /// Raw status string as reported by the orchestrator.
    pub status: String,
    /// Published port mappings, as reported.
    pub ports: String,
}

/// Asks about and converges on the declared container set.
pub trait ContainerOrchestrator: Send + Sync {
    /// Returns the observed status of the named container.
    ///
    /// # Errors
    ///
    /// Returns an error only when the orchestrator itself cannot be
    /// invoked; an unreachable daemon yields `Ok(ContainerStatus::Unknown)`.
    fn status(&self, name: &str) -> Result<ContainerStatus, PortError>;

    /// Brings the declared container set up (create, start, reconcile).
    ///
    /// # Errors
    ///
    /// Returns an error when the orchestrator reports a failure to
    /// converge on the declared state.
    fn apply_declared_state(&self) -> Result<(), PortError>;

    /// Lists currently known containers, `ps`-style.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing command cannot run.
    fn ps(&self) -> Result<Vec<ContainerInfo>, PortError>;
}
