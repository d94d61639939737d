//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the runner core and an external
//! system (time, shell, package/service manager, container orchestrator,
//! network reachability, filesystem, IDs). Implementations live in
//! `src/adapters/`.

pub mod clock;
pub mod containers;
pub mod filesystem;
pub mod host;
pub mod id_gen;
pub mod net;
pub mod shell;

pub use clock::Clock;
pub use containers::{ContainerInfo, ContainerOrchestrator, ContainerStatus};
pub use filesystem::FileSystem;
pub use host::HostManager;
pub use id_gen::IdGenerator;
pub use net::{EndpointProber, ProbeFuture, Reachability};
pub use shell::{ShellExecutor, ShellOutput};

/// Boxed error type shared by all port trait methods.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;
