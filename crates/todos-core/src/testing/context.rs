//! TestContext - temporary store directories with automatic cleanup

use std::path::Path;
use tempfile::TempDir;

/// Context owning a unique temporary directory for one test
///
/// The directory is guaranteed to exist before the context is handed out
/// and is removed when the context is dropped, releasing LMDB locks with
/// it.
pub struct TestContext {
    /// Temporary directory for this test
    temp_dir: TempDir,
}

impl TestContext {
    /// Create a new TestContext with a unique temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory");

        Self { temp_dir }
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
