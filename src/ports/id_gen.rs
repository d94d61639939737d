//! ID generator port for run identifiers.

/// Generates unique identifiers for verification runs.
pub trait IdGenerator: Send + Sync {
    /// Returns a new unique identifier.
    fn generate_id(&self) -> String;
}
