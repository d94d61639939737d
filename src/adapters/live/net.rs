//! Live endpoint prober using reqwest for HTTP and tokio for TCP.

use crate::endpoint::EndpointTarget;
use crate::ports::net::{EndpointProber, ProbeFuture, Reachability};

/// Live prober that issues real HTTP requests and TCP connects.
///
/// One attempt per call; the per-attempt timeout is enforced by the
/// endpoint checker, not here.
pub struct LiveEndpointProber {
    client: reqwest::Client,
}

impl LiveEndpointProber {
    /// Creates a prober with a fresh HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for LiveEndpointProber {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointProber for LiveEndpointProber {
    fn probe(&self, target: &EndpointTarget) -> ProbeFuture<'_> {
        let target = target.clone();
        Box::pin(async move {
            match target {
                EndpointTarget::Http { url } => match self.client.get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => Reachability::Reachable,
                    Ok(resp) => {
                        Reachability::Unreachable { reason: format!("HTTP {}", resp.status()) }
                    }
                    Err(e) => Reachability::Unreachable { reason: e.to_string() },
                },
                EndpointTarget::Tcp { addr } => {
                    match tokio::net::TcpStream::connect(&addr).await {
                        Ok(_) => Reachability::Reachable,
                        Err(e) => Reachability::Unreachable { reason: e.to_string() },
                    }
                }
            }
        })
    }
}
