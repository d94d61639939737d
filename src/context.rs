//! Service context bundling all port trait objects.

use std::sync::Arc;

use crate::adapters::live::{
    ComposeOrchestrator, LiveClock, LiveEndpointProber, LiveFileSystem, LiveHostManager,
    LiveIdGenerator, LiveShellExecutor,
};
use crate::config::RunnerConfig;
use crate::ports::clock::Clock;
use crate::ports::containers::ContainerOrchestrator;
use crate::ports::filesystem::FileSystem;
use crate::ports::host::HostManager;
use crate::ports::id_gen::IdGenerator;
use crate::ports::net::EndpointProber;
use crate::ports::shell::ShellExecutor;

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. The endpoint
/// prober is `Arc` rather than `Box` because the checker shares it across
/// concurrent polling tasks.
pub struct ServiceContext {
    /// Clock for timestamps, durations, and phase deadlines.
    pub clock: Box<dyn Clock>,
    /// Shell executor for ad-hoc system commands.
    pub shell: Box<dyn ShellExecutor>,
    /// Package and service manager.
    pub host: Box<dyn HostManager>,
    /// Container orchestrator for the declared container set.
    pub containers: Box<dyn ContainerOrchestrator>,
    /// Filesystem for config-file and directory remediation.
    pub fs: Box<dyn FileSystem>,
    /// Endpoint prober for HTTP/TCP health polling.
    pub net: Arc<dyn EndpointProber>,
    /// ID generator for run identifiers.
    pub id_gen: Box<dyn IdGenerator>,
}

impl ServiceContext {
    /// Creates a live context with real adapters for every port.
    #[must_use]
    pub fn live(config: &RunnerConfig) -> Self {
        Self {
            clock: Box::new(LiveClock),
            shell: Box::new(LiveShellExecutor),
            host: Box::new(LiveHostManager::new(config.call_timeout)),
            containers: Box::new(ComposeOrchestrator::new(
                config.compose_file.clone(),
                config.call_timeout,
            )),
            fs: Box::new(LiveFileSystem),
            net: Arc::new(LiveEndpointProber::new()),
            id_gen: Box::new(LiveIdGenerator),
        }
    }
}
