//! Service endpoint checker: bounded parallel polling of declared
//! HTTP/TCP endpoints until healthy or timed out.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::ports::net::{EndpointProber, Reachability};

/// Where an endpoint lives and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
pub enum EndpointTarget {
    /// HTTP GET; healthy on a 2xx response.
    Http {
        /// URL to request.
        url: String,
    },
    /// Plain TCP connect; healthy when the connection is accepted.
    Tcp {
        /// `host:port` to connect to.
        addr: String,
    },
}

impl EndpointTarget {
    /// Returns the URL or address identifying this target.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Http { url } => url,
            Self::Tcp { addr } => addr,
        }
    }
}

/// A declared endpoint to wait on. Static, declared by the plan, never
/// discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// Endpoint name for reports.
    pub name: String,
    /// Target to poll.
    #[serde(flatten)]
    pub target: EndpointTarget,
    /// Whether a timeout here fails the run instead of warning.
    #[serde(default)]
    pub required: bool,
}

/// Terminal state of one endpoint wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EndpointStatus {
    /// The endpoint answered healthily.
    Healthy {
        /// Attempt number that succeeded (1-based).
        attempts: u32,
    },
    /// The endpoint never answered within the attempt budget.
    TimedOut {
        /// Attempts made.
        attempts: u32,
    },
}

/// Outcome of waiting on one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointResult {
    /// Endpoint name.
    pub name: String,
    /// Whether the endpoint was declared required.
    pub required: bool,
    /// Terminal state.
    pub status: EndpointStatus,
}

impl EndpointResult {
    /// Returns `true` when this result should fail the run: a required
    /// endpoint that timed out. Optional timeouts are warnings.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.required && matches!(self.status, EndpointStatus::TimedOut { .. })
    }
}

/// Polling budget for one checker invocation.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Interval between attempts.
    pub interval: Duration,
    /// Timeout for a single attempt, so a hung connection cannot stall
    /// the overall budget.
    pub attempt_timeout: Duration,
    /// Maximum attempts per endpoint.
    pub max_attempts: u32,
}

/// Waits for every endpoint to become healthy or exhaust its attempts.
///
/// Endpoints are polled on independent concurrent tasks; each task owns
/// its own attempt counter and writes its final status exactly once, so
/// no shared mutable state exists between pollers. Results come back in
/// declared order.
pub async fn wait_for_all(
    prober: Arc<dyn EndpointProber>,
    specs: Vec<EndpointSpec>,
    policy: PollPolicy,
) -> Vec<EndpointResult> {
    let mut tasks = JoinSet::new();
    let count = specs.len();
    for (index, spec) in specs.into_iter().enumerate() {
        let prober = Arc::clone(&prober);
        let policy = policy.clone();
        tasks.spawn(async move { (index, poll_one(&*prober, spec, &policy).await) });
    }

    let mut slots: Vec<Option<EndpointResult>> = (0..count).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        if let Ok((index, result)) = joined {
            slots[index] = Some(result);
        }
    }
    slots.into_iter().flatten().collect()
}

/// Blocking wrapper over [`wait_for_all`] for the synchronous runner.
///
/// # Errors
///
/// Returns an error if the async runtime cannot be built.
pub fn wait_for_all_blocking(
    prober: Arc<dyn EndpointProber>,
    specs: Vec<EndpointSpec>,
    policy: PollPolicy,
) -> Result<Vec<EndpointResult>, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build async runtime: {e}"))?;
    Ok(runtime.block_on(wait_for_all(prober, specs, policy)))
}

async fn poll_one(
    prober: &dyn EndpointProber,
    spec: EndpointSpec,
    policy: &PollPolicy,
) -> EndpointResult {
    for attempt in 1..=policy.max_attempts {
        let reached = tokio::time::timeout(policy.attempt_timeout, prober.probe(&spec.target))
            .await
            .unwrap_or(Reachability::Unreachable { reason: "attempt timed out".into() });
        if reached == Reachability::Reachable {
            return EndpointResult {
                name: spec.name,
                required: spec.required,
                status: EndpointStatus::Healthy { attempts: attempt },
            };
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    EndpointResult {
        name: spec.name,
        required: spec.required,
        status: EndpointStatus::TimedOut { attempts: policy.max_attempts },
    }
}
