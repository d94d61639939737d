//! Package and service manager port.

use super::PortError;

/// Queries and mutates host package and service state.
///
/// Queries (`is_installed`, `is_active`, `is_root`) are side-effect free
/// and safe to call repeatedly. Mutations (`install`, `start`) are only
/// invoked by remediation actions when the matching probe currently fails.
pub trait HostManager: Send + Sync {
    /// Returns `true` if the named package is installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager cannot be queried at all
    /// (missing binary, spawn failure), as opposed to "not installed".
    fn is_installed(&self, package: &str) -> Result<bool, PortError>;

    /// Installs the named package.
    ///
    /// # Errors
    ///
    /// Returns an error when installation fails, including transient
    /// conditions such as a held package manager lock.
    fn install(&self, package: &str) -> Result<(), PortError>;

    /// Returns `true` if the named system service is currently active.
    ///
    /// # Errors
    ///
    /// Returns an error if the service manager cannot be queried.
    fn is_active(&self, service: &str) -> Result<bool, PortError>;

    /// Starts (and enables) the named system service.
    ///
    /// # Errors
    ///
    /// Returns an error when the service manager refuses the request.
    fn start(&self, service: &str) -> Result<(), PortError>;

    /// Returns `true` if the calling process has root privileges.
    fn is_root(&self) -> bool;
}
