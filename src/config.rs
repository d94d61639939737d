//! Immutable runner configuration.
//!
//! Built once at the CLI layer (optionally from `CONVERGE_*` environment
//! overrides) and passed down by reference; nothing below the command
//! layer reads the environment.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a single runner invocation.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Timeout applied to every underlying system call.
    pub call_timeout: Duration,
    /// Wall-clock budget for a single phase.
    pub phase_deadline: chrono::Duration,
    /// Interval between endpoint poll attempts.
    pub poll_interval: Duration,
    /// Timeout for a single endpoint poll attempt.
    pub attempt_timeout: Duration,
    /// Maximum poll attempts per endpoint.
    pub max_attempts: u32,
    /// Compose file describing the declared container set.
    pub compose_file: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            phase_deadline: chrono::Duration::minutes(15),
            poll_interval: Duration::from_secs(10),
            attempt_timeout: Duration::from_secs(10),
            max_attempts: 60,
            compose_file: PathBuf::from("docker-compose.yml"),
        }
    }
}

impl RunnerConfig {
    /// Builds a configuration from defaults plus `CONVERGE_*` environment
    /// overrides. Unparseable values fall back to the default silently
    /// rather than aborting a run over a malformed override.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = env_u64("CONVERGE_CALL_TIMEOUT_SECS") {
            config.call_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("CONVERGE_PHASE_DEADLINE_SECS") {
            config.phase_deadline =
                chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX));
        }
        if let Some(secs) = env_u64("CONVERGE_POLL_INTERVAL_SECS") {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("CONVERGE_ATTEMPT_TIMEOUT_SECS") {
            config.attempt_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = env_u64("CONVERGE_MAX_ATTEMPTS") {
            config.max_attempts = u32::try_from(n).unwrap_or(u32::MAX);
        }
        if let Ok(path) = std::env::var("CONVERGE_COMPOSE_FILE") {
            if !path.is_empty() {
                config.compose_file = PathBuf::from(path);
            }
        }
        config
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
