//! Live shell executor using `std::process::Command` with a kill-on-timeout.

use std::io::Read;
use std::process::{ChildStderr, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::ports::shell::{ShellExecutor, ShellOutput};
use crate::ports::PortError;

const WAIT_POLL: Duration = Duration::from_millis(25);

/// Live shell executor that runs commands via `sh -c`.
///
/// Commands that outlive their timeout are killed and reported as an
/// execution error rather than a nonzero exit.
pub struct LiveShellExecutor;

impl ShellExecutor for LiveShellExecutor {
    fn run(&self, command: &str, timeout: Duration) -> Result<ShellOutput, PortError> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain pipes on their own threads so a chatty child cannot block
        // on a full pipe buffer while we poll for exit.
        let stdout = child.stdout.take().map(drain_stdout);
        let stderr = child.stderr.take().map(drain_stderr);

        let deadline = Instant::now() + timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                join_drain(stdout);
                join_drain(stderr);
                return Err(format!(
                    "command timed out after {}s: {command}",
                    timeout.as_secs()
                )
                .into());
            }
            thread::sleep(WAIT_POLL);
        };

        Ok(ShellOutput {
            exit_code: status.code().unwrap_or(-1),
            stdout: join_drain(stdout),
            stderr: join_drain(stderr),
        })
    }
}

fn drain_stdout(mut pipe: ChildStdout) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        let _ = pipe.read_to_string(&mut buf);
        buf
    })
}

fn drain_stderr(mut pipe: ChildStderr) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        let _ = pipe.read_to_string(&mut buf);
        buf
    })
}

fn join_drain(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
