use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const PROJECT_A: &[u8] = include_bytes!("../fixtures/project_a.xml");
pub const PROJECT_B: &[u8] = include_bytes!("../fixtures/project_b.xml");

/// Create a fresh temporary repo root, returning the dir handle and its path.
/// The caller must hold onto `TempDir` to keep the temp directory alive.
pub fn setup_repo() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    (dir, root)
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

/// Lay out both fixture reports the way two test projects would leave them.
pub fn write_two_projects(root: &Path) {
    write(
        root,
        "tests/App.Core.Tests/TestResults/aaaa/coverage.cobertura.xml",
        PROJECT_A,
    );
    write(
        root,
        "tests/App.Desktop.Tests/TestResults/bbbb/coverage.cobertura.xml",
        PROJECT_B,
    );
}
