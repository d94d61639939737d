//! Shell executor port for running external commands.

use std::time::Duration;

use super::PortError;

/// The output of a shell command execution.
#[derive(Debug, Clone)]
pub struct ShellOutput {
    /// The exit code of the process.
    pub exit_code: i32,
    /// The captured standard output.
    pub stdout: String,
    /// The captured standard error.
    pub stderr: String,
}

impl ShellOutput {
    /// Returns `true` if the command exited with code zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes shell commands with a bounded runtime.
///
/// Every invocation carries an explicit timeout so a hung system command
/// cannot stall a whole plan run. Abstracting shell execution lets probes
/// run against scripted command output in tests.
pub trait ShellExecutor: Send + Sync {
    /// Runs a command string in the system shell and returns its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or does not
    /// finish within `timeout`. A nonzero exit code is not an error.
    fn run(&self, command: &str, timeout: Duration) -> Result<ShellOutput, PortError>;
}
