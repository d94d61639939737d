//! Network reachability port for endpoint health polling.

use std::future::Future;
use std::pin::Pin;

use crate::endpoint::EndpointTarget;

/// Boxed future type alias used by [`EndpointProber`] to keep the trait
/// dyn-compatible.
pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = Reachability> + Send + 'a>>;

/// Outcome of a single reachability attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reachability {
    /// The endpoint answered and looked healthy.
    Reachable,
    /// The endpoint did not answer, refused, or answered unhealthily.
    Unreachable {
        /// Short reason for the failed attempt.
        reason: String,
    },
}

/// Probes a single HTTP or TCP endpoint once.
///
/// One attempt, no retries; retry and backoff policy belong to the
/// endpoint checker. Infallible by contract: every network or protocol
/// error folds into `Reachability::Unreachable`.
pub trait EndpointProber: Send + Sync {
    /// Attempts to reach the given target once.
    fn probe(&self, target: &EndpointTarget) -> ProbeFuture<'_>;
}
