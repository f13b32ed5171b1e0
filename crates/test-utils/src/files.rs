//! Scratch directories for file-backed fixtures.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Creates an empty scratch directory that is removed on drop.
pub fn scratch_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create scratch dir")
}

/// Writes `contents` to `dir/name`, creating parent directories.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create fixture dir");
    }
    std::fs::write(&path, contents).expect("failed to write fixture");
    path
}
