//! Live adapters backed by the real host.

pub mod clock;
pub mod containers;
pub mod filesystem;
pub mod host;
pub mod id_gen;
pub mod net;
pub mod shell;

pub use clock::LiveClock;
pub use containers::ComposeOrchestrator;
pub use filesystem::LiveFileSystem;
pub use host::LiveHostManager;
pub use id_gen::LiveIdGenerator;
pub use net::LiveEndpointProber;
pub use shell::LiveShellExecutor;
