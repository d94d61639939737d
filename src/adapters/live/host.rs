//! Live package/service manager using dpkg, apt-get, and systemctl.

use std::time::Duration;

use crate::ports::host::HostManager;
use crate::ports::shell::ShellExecutor;
use crate::ports::PortError;

use super::shell::LiveShellExecutor;

/// How long to allow a package installation to run. Queries use the much
/// shorter per-call timeout passed at construction.
const INSTALL_TIMEOUT: Duration = Duration::from_secs(600);

/// Live host manager that shells out to dpkg, apt-get, and systemctl.
pub struct LiveHostManager {
    shell: LiveShellExecutor,
    call_timeout: Duration,
}

impl LiveHostManager {
    /// Creates a host manager whose queries are bounded by `call_timeout`.
    #[must_use]
    pub fn new(call_timeout: Duration) -> Self {
        Self { shell: LiveShellExecutor, call_timeout }
    }
}

impl HostManager for LiveHostManager {
    fn is_installed(&self, package: &str) -> Result<bool, PortError> {
        let out = self
            .shell
            .run(&format!("dpkg-query -W -f '${{Status}}' {package}"), self.call_timeout)?;
        Ok(out.success() && out.stdout.contains("install ok installed"))
    }

    fn install(&self, package: &str) -> Result<(), PortError> {
        let out = self.shell.run(
            &format!("DEBIAN_FRONTEND=noninteractive apt-get install -y {package}"),
            INSTALL_TIMEOUT,
        )?;
        if out.success() {
            Ok(())
        } else {
            Err(format!("apt-get install {package} failed: {}", out.stderr.trim()).into())
        }
    }

    fn is_active(&self, service: &str) -> Result<bool, PortError> {
        let out = self.shell.run(&format!("systemctl is-active {service}"), self.call_timeout)?;
        Ok(out.success())
    }

    fn start(&self, service: &str) -> Result<(), PortError> {
        let out = self
            .shell
            .run(&format!("systemctl enable --now {service}"), self.call_timeout)?;
        if out.success() {
            Ok(())
        } else {
            Err(format!("systemctl enable --now {service} failed: {}", out.stderr.trim()).into())
        }
    }

    fn is_root(&self) -> bool {
        self.shell
            .run("id -u", self.call_timeout)
            .map(|out| out.stdout.trim() == "0")
            .unwrap_or(false)
    }
}
