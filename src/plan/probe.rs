//! Probes: side-effect-free checks of current host state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::ServiceContext;
use crate::error::RunError;
use crate::ports::containers::ContainerStatus;
use crate::ports::PortError;

/// Outcome of running a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The condition holds.
    Pass,
    /// The condition does not hold. This is a normal result, not an error.
    Fail {
        /// Why the condition does not hold.
        reason: String,
    },
}

/// What a probe checks. Typed results instead of shell-output grepping,
/// so every kind can run against fake ports in tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeKind {
    /// A system service is active.
    ServiceActive {
        /// Service name.
        service: String,
    },
    /// A package is installed.
    PackageInstalled {
        /// Package name.
        package: String,
    },
    /// A binary resolves on `PATH`.
    BinaryPresent {
        /// Binary name.
        binary: String,
    },
    /// A GPU is visible to the driver stack.
    GpuPresent,
    /// No listener occupies the given TCP port.
    PortFree {
        /// TCP port number.
        port: u16,
    },
    /// Something is listening on the given TCP port.
    PortListening {
        /// TCP port number.
        port: u16,
    },
    /// A hostname resolves.
    DnsResolves {
        /// Hostname to resolve.
        host: String,
    },
    /// A named container is running.
    ContainerRunning {
        /// Container name.
        container: String,
    },
    /// A path exists on the filesystem.
    PathExists {
        /// Path to check.
        path: PathBuf,
    },
}

/// A single idempotent check. Running it never mutates host state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probe {
    /// Unique identifier.
    pub id: String,
    /// Name of the phase this probe belongs to.
    pub phase: String,
    /// Human-readable description for reports.
    pub description: String,
    /// What to check.
    #[serde(flatten)]
    pub kind: ProbeKind,
}

/// Registry of probes, keyed by id, preserving registration order.
#[derive(Debug, Default)]
pub struct ProbeSet {
    probes: Vec<Probe>,
    index: HashMap<String, usize>,
}

impl ProbeSet {
    /// Creates an empty probe set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a probe.
    ///
    /// # Errors
    ///
    /// Returns an error if a probe with the same id is already registered.
    pub fn register(&mut self, probe: Probe) -> Result<(), String> {
        if self.index.contains_key(&probe.id) {
            return Err(format!("duplicate probe id: {}", probe.id));
        }
        self.index.insert(probe.id.clone(), self.probes.len());
        self.probes.push(probe);
        Ok(())
    }

    /// Looks up a probe by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Probe> {
        self.index.get(id).map(|&i| &self.probes[i])
    }

    /// Runs the probe with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::ProbeExecution`] when the check itself cannot
    /// run (unknown id, missing binary, spawn failure, command timeout) —
    /// distinct from `Ok(ProbeOutcome::Fail)`, which means the condition
    /// is not met.
    pub fn run(
        &self,
        id: &str,
        ctx: &ServiceContext,
        call_timeout: Duration,
    ) -> Result<ProbeOutcome, RunError> {
        let probe = self.get(id).ok_or_else(|| RunError::ProbeExecution {
            probe_id: id.to_string(),
            detail: "unknown probe id".to_string(),
        })?;
        evaluate(&probe.kind, ctx, call_timeout).map_err(|e| RunError::ProbeExecution {
            probe_id: id.to_string(),
            detail: e.to_string(),
        })
    }

    /// Iterates probes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Probe> {
        self.probes.iter()
    }
}

fn evaluate(
    kind: &ProbeKind,
    ctx: &ServiceContext,
    timeout: Duration,
) -> Result<ProbeOutcome, PortError> {
    match kind {
        ProbeKind::ServiceActive { service } => {
            Ok(outcome(ctx.host.is_active(service)?, || format!("service {service} is not active")))
        }
        ProbeKind::PackageInstalled { package } => Ok(outcome(
            ctx.host.is_installed(package)?,
            || format!("package {package} is not installed"),
        )),
        ProbeKind::BinaryPresent { binary } => {
            let out = ctx.shell.run(&format!("command -v {binary}"), timeout)?;
            Ok(outcome(out.success(), || format!("{binary} not found on PATH")))
        }
        ProbeKind::GpuPresent => {
            let out = ctx.shell.run("nvidia-smi -L", timeout)?;
            Ok(outcome(out.success() && !out.stdout.trim().is_empty(), || {
                "no GPU visible to nvidia-smi".to_string()
            }))
        }
        ProbeKind::PortFree { port } => {
            let out = ctx.shell.run(&listeners_on(*port), timeout)?;
            if !out.success() {
                return Err(format!("ss query failed with exit code {}", out.exit_code).into());
            }
            Ok(outcome(out.stdout.trim().is_empty(), || {
                format!("port {port} is already in use")
            }))
        }
        ProbeKind::PortListening { port } => {
            let out = ctx.shell.run(&listeners_on(*port), timeout)?;
            if !out.success() {
                return Err(format!("ss query failed with exit code {}", out.exit_code).into());
            }
            Ok(outcome(!out.stdout.trim().is_empty(), || {
                format!("nothing listening on port {port}")
            }))
        }
        ProbeKind::DnsResolves { host } => {
            let out = ctx.shell.run(&format!("getent hosts {host}"), timeout)?;
            Ok(outcome(out.success(), || format!("{host} does not resolve")))
        }
        ProbeKind::ContainerRunning { container } => {
            match ctx.containers.status(container)? {
                ContainerStatus::Up => Ok(ProbeOutcome::Pass),
                ContainerStatus::Down => {
                    Ok(ProbeOutcome::Fail { reason: format!("container {container} is down") })
                }
                ContainerStatus::Unknown => Ok(ProbeOutcome::Fail {
                    reason: format!("container {container} state unknown (daemon unreachable?)"),
                }),
            }
        }
        ProbeKind::PathExists { path } => Ok(outcome(ctx.fs.exists(path), || {
            format!("{} does not exist", path.display())
        })),
    }
}

fn listeners_on(port: u16) -> String {
    format!("ss -H -ltn 'sport = :{port}'")
}

fn outcome(pass: bool, reason: impl FnOnce() -> String) -> ProbeOutcome {
    if pass {
        ProbeOutcome::Pass
    } else {
        ProbeOutcome::Fail { reason: reason() }
    }
}
