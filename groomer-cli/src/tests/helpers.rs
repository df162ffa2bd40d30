//! Test helpers for writing cells files into temporary workspaces.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// Temporary directory addressed through UTF-8 paths.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub(super) fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.path(name);
        write_utf8(&path, contents);
        path
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &str) {
    fs::write(path.as_std_path(), contents).expect("write fixture file");
}

pub(super) const TWO_CELLS: &str = r#"[
    {"name": "Miami", "latitude": 25.7617, "longitude": -80.1918, "initial_radius_km": 45},
    {"name": "Key West", "latitude": 24.5551, "longitude": -81.78, "initial_radius_km": 16}
]"#;
