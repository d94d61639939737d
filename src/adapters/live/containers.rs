//! Live container orchestrator backed by Docker Compose.

use std::path::PathBuf;
use std::time::Duration;

use crate::ports::containers::{ContainerInfo, ContainerOrchestrator, ContainerStatus};
use crate::ports::shell::ShellExecutor;
use crate::ports::PortError;

use super::shell::LiveShellExecutor;

/// Bringing a full container set up can pull images; allow it minutes.
const APPLY_TIMEOUT: Duration = Duration::from_secs(900);

/// Live orchestrator that shells out to `docker` and `docker compose`.
pub struct ComposeOrchestrator {
    shell: LiveShellExecutor,
    compose_file: PathBuf,
    call_timeout: Duration,
}

impl ComposeOrchestrator {
    /// Creates an orchestrator for the given compose file.
    #[must_use]
    pub fn new(compose_file: PathBuf, call_timeout: Duration) -> Self {
        Self { shell: LiveShellExecutor, compose_file, call_timeout }
    }
}

impl ContainerOrchestrator for ComposeOrchestrator {
    fn status(&self, name: &str) -> Result<ContainerStatus, PortError> {
        let out = self
            .shell
            .run(&format!("docker inspect -f '{{{{.State.Running}}}}' {name}"), self.call_timeout)?;
        if !out.success() {
            // Distinguish "no such container" from an unreachable daemon.
            if out.stderr.contains("No such object") || out.stderr.contains("No such container") {
                return Ok(ContainerStatus::Down);
            }
            return Ok(ContainerStatus::Unknown);
        }
        match out.stdout.trim() {
            "true" => Ok(ContainerStatus::Up),
            "false" => Ok(ContainerStatus::Down),
            _ => Ok(ContainerStatus::Unknown),
        }
    }

    fn apply_declared_state(&self) -> Result<(), PortError> {
        let out = self.shell.run(
            &format!("docker compose -f {} up -d --remove-orphans", self.compose_file.display()),
            APPLY_TIMEOUT,
        )?;
        if out.success() {
            Ok(())
        } else {
            Err(format!("docker compose up failed: {}", out.stderr.trim()).into())
        }
    }

    fn ps(&self) -> Result<Vec<ContainerInfo>, PortError> {
        let out = self.shell.run(
            "docker ps --format '{{.Names}}\t{{.Status}}\t{{.Ports}}'",
            self.call_timeout,
        )?;
        if !out.success() {
            return Err(format!("docker ps failed: {}", out.stderr.trim()).into());
        }
        Ok(out.stdout.lines().filter(|l| !l.trim().is_empty()).map(parse_ps_line).collect())
    }
}

fn parse_ps_line(line: &str) -> ContainerInfo {
    let mut fields = line.splitn(3, '\t');
    ContainerInfo {
        name: fields.next().unwrap_or("").to_string(),
        status: fields.next().unwrap_or("").to_string(),
        ports: fields.next().unwrap_or("").to_string(),
    }
}
