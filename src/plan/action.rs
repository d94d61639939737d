//! Actions: remediation routines, each owned by exactly one probe.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::context::ServiceContext;

/// Outcome of applying an action.
///
/// Expected remediation failures (package manager lock, orchestrator
/// refusing) are values, not errors; the runner records them and still
/// re-checks the owning probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action ran to completion.
    Applied,
    /// The action ran but reported failure.
    Failed {
        /// Why remediation did not succeed.
        detail: String,
    },
}

/// What an action does to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    /// Install a package.
    InstallPackage {
        /// Package name.
        package: String,
    },
    /// Start (and enable) a system service.
    StartService {
        /// Service name.
        service: String,
    },
    /// Create a directory and its parents.
    CreateDirectory {
        /// Directory path.
        path: PathBuf,
    },
    /// Write a config file, replacing any existing contents.
    WriteConfigFile {
        /// File path.
        path: PathBuf,
        /// File contents.
        contents: String,
    },
    /// Bring the declared container set up via the orchestrator.
    ApplyDeclaredContainers,
}

/// A remediation routine tied to exactly one probe.
///
/// Individually an action may be non-idempotent; the plan stays
/// idempotent because the runner only applies it when the owning probe
/// currently fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier.
    pub id: String,
    /// Id of the probe this action remediates.
    pub applies_to: String,
    /// Whether the action needs root privileges.
    #[serde(default)]
    pub needs_root: bool,
    /// Whether a successful application needs a host restart before the
    /// probe can pass. The runner surfaces this instead of re-checking.
    #[serde(default)]
    pub requires_restart: bool,
    /// What to do.
    #[serde(flatten)]
    pub kind: ActionKind,
}

/// Registry of actions, keyed by id and by owning probe.
#[derive(Debug, Default)]
pub struct ActionSet {
    actions: Vec<Action>,
    by_id: HashMap<String, usize>,
    by_probe: HashMap<String, usize>,
}

impl ActionSet {
    /// Creates an empty action set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action.
    ///
    /// # Errors
    ///
    /// Returns an error on a duplicate action id, or when another action
    /// already owns the same probe (every action has exactly one owning
    /// probe, and every probe at most one action).
    pub fn register(&mut self, action: Action) -> Result<(), String> {
        if self.by_id.contains_key(&action.id) {
            return Err(format!("duplicate action id: {}", action.id));
        }
        if self.by_probe.contains_key(&action.applies_to) {
            return Err(format!("probe {} already has an action", action.applies_to));
        }
        self.by_id.insert(action.id.clone(), self.actions.len());
        self.by_probe.insert(action.applies_to.clone(), self.actions.len());
        self.actions.push(action);
        Ok(())
    }

    /// Returns the action owned by the given probe, if any.
    #[must_use]
    pub fn for_probe(&self, probe_id: &str) -> Option<&Action> {
        self.by_probe.get(probe_id).map(|&i| &self.actions[i])
    }

    /// Applies the action with the given id.
    ///
    /// Unknown ids and port errors both fold into
    /// [`ActionOutcome::Failed`]; apply never panics and never returns a
    /// hard error for an expected remediation failure.
    #[must_use]
    pub fn apply(&self, id: &str, ctx: &ServiceContext) -> ActionOutcome {
        let Some(&i) = self.by_id.get(id) else {
            return ActionOutcome::Failed { detail: format!("unknown action id: {id}") };
        };
        let result = match &self.actions[i].kind {
            ActionKind::InstallPackage { package } => ctx.host.install(package),
            ActionKind::StartService { service } => ctx.host.start(service),
            ActionKind::CreateDirectory { path } => ctx.fs.create_dir_all(path),
            ActionKind::WriteConfigFile { path, contents } => ctx.fs.write(path, contents),
            ActionKind::ApplyDeclaredContainers => ctx.containers.apply_declared_state(),
        };
        match result {
            Ok(()) => ActionOutcome::Applied,
            Err(e) => ActionOutcome::Failed { detail: e.to_string() },
        }
    }

    /// Iterates actions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }
}
