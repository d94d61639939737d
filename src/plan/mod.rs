//! Plan model: phases, probes, actions, and the endpoint phase.
//!
//! A plan comes from the built-in registry or a YAML plan file; either
//! way it is validated into a [`Plan`] plus [`ProbeSet`] and
//! [`ActionSet`] registries before anything runs.

pub mod action;
pub mod probe;
pub mod registry;
pub mod runner;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointSpec;

pub use action::{Action, ActionKind, ActionOutcome, ActionSet};
pub use probe::{Probe, ProbeKind, ProbeOutcome, ProbeSet};
pub use runner::{Mode, PlanRunner};

/// An ordered group of related probes. Phases execute strictly in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    /// Phase name, unique within a plan.
    pub name: String,
    /// Whether a failure here blocks dependent later phases.
    #[serde(default)]
    pub critical: bool,
    /// Names of earlier phases this phase depends on.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Ordered probe ids executed in this phase.
    pub probes: Vec<String>,
}

/// The endpoint-wait phase: declared HTTP/TCP endpoints polled in
/// parallel after the probe phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointPhase {
    /// Phase name.
    pub name: String,
    /// Names of probe phases this phase depends on.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Endpoints to poll.
    pub endpoints: Vec<EndpointSpec>,
}

/// A validated plan: ordered probe phases plus an optional endpoint phase.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Probe phases in execution order.
    pub phases: Vec<Phase>,
    /// Endpoint phase, when the plan declares one.
    pub endpoints: Option<EndpointPhase>,
}

/// On-disk plan document, as parsed from YAML before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDocument {
    /// Probe phases in execution order.
    pub phases: Vec<Phase>,
    /// All probes referenced by the phases.
    pub probes: Vec<Probe>,
    /// Remediation actions, each owned by one probe.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Endpoint phase, optional.
    #[serde(default)]
    pub endpoints: Option<EndpointPhase>,
}

impl PlanDocument {
    /// Parses a plan document from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed.
    pub fn from_yaml(text: &str) -> Result<Self, String> {
        serde_yaml::from_str(text).map_err(|e| format!("failed to parse plan: {e}"))
    }

    /// Validates the document and splits it into runnable parts.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate ids, dangling references, a probe
    /// declaring a different phase than the one listing it, a probe
    /// listed by more than one phase, or `depends_on` naming a phase not
    /// declared earlier.
    pub fn into_parts(self) -> Result<(Plan, ProbeSet, ActionSet), String> {
        let mut probes = ProbeSet::new();
        for probe in self.probes {
            probes.register(probe)?;
        }

        let mut actions = ActionSet::new();
        for action in self.actions {
            if probes.get(&action.applies_to).is_none() {
                return Err(format!(
                    "action {} applies to unknown probe {}",
                    action.id, action.applies_to
                ));
            }
            actions.register(action)?;
        }

        let mut seen_phases: HashSet<&str> = HashSet::new();
        let mut assigned: HashSet<&str> = HashSet::new();
        for phase in &self.phases {
            if !seen_phases.insert(&phase.name) {
                return Err(format!("duplicate phase name: {}", phase.name));
            }
            for dep in &phase.depends_on {
                if !seen_phases.contains(dep.as_str()) || dep == &phase.name {
                    return Err(format!(
                        "phase {} depends on {dep}, which is not declared earlier",
                        phase.name
                    ));
                }
            }
            for probe_id in &phase.probes {
                let Some(probe) = probes.get(probe_id) else {
                    return Err(format!("phase {} lists unknown probe {probe_id}", phase.name));
                };
                if probe.phase != phase.name {
                    return Err(format!(
                        "probe {probe_id} declares phase {} but is listed under {}",
                        probe.phase, phase.name
                    ));
                }
                if !assigned.insert(probe_id) {
                    return Err(format!("probe {probe_id} is listed by more than one phase"));
                }
            }
        }

        if let Some(endpoints) = &self.endpoints {
            for dep in &endpoints.depends_on {
                if !seen_phases.contains(dep.as_str()) {
                    return Err(format!(
                        "endpoint phase {} depends on unknown phase {dep}",
                        endpoints.name
                    ));
                }
            }
        }

        Ok((Plan { phases: self.phases, endpoints: self.endpoints }, probes, actions))
    }
}
