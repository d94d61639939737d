//! Live filesystem adapter using `std::fs`.

use std::path::Path;

use crate::ports::filesystem::FileSystem;
use crate::ports::PortError;

/// Live filesystem that performs real file I/O.
pub struct LiveFileSystem;

impl FileSystem for LiveFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, PortError> {
        std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()).into())
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), PortError> {
        std::fs::write(path, contents)
            .map_err(|e| format!("failed to write {}: {e}", path.display()).into())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), PortError> {
        std::fs::create_dir_all(path)
            .map_err(|e| format!("failed to create {}: {e}", path.display()).into())
    }
}
