//! Capability-based filesystem helpers built on `cap-std` and `camino`.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::OpenOptions, fs_utf8};
use std::io;
use std::path::Component;

/// A file opened for appending, with a note of whether it held any bytes.
#[derive(Debug)]
pub struct AppendTarget {
    /// Handle positioned at the end of the file.
    pub file: fs_utf8::File,
    /// `true` when the file was created by this call or was already empty.
    pub was_empty: bool,
}

/// Open a UTF-8 path for reading using ambient authority.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Open `path` for appending, creating it (and its parent directories) if needed.
///
/// Existing bytes are never read or truncated.
pub fn open_append(path: &Utf8Path) -> io::Result<AppendTarget> {
    ensure_parent_dir(path)?;
    let (dir, file_name) = open_parent_and_name(path)?;
    let mut options = OpenOptions::new();
    options.append(true).create(true);
    let file = dir.open_with(file_name.as_str(), &options)?;
    let was_empty = file.metadata()?.len() == 0;
    Ok(AppendTarget { file, was_empty })
}

/// Create the parent directory of `path` when it is missing.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }
    let (anchor, relative) = split_anchor(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    anchor.create_dir_all(&relative)
}

/// Open the directory containing `path` and return it alongside the file name.
fn open_parent_and_name(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Split a directory path into an ambient anchor (root, drive, or `.`) and
/// the remainder relative to it.
fn split_anchor(dir: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let anchor = match dir.as_std_path().components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            Utf8PathBuf::from(prefix).join(std::path::MAIN_SEPARATOR.to_string())
        }
        Some(Component::RootDir) => Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string()),
        _ => Utf8PathBuf::from("."),
    };
    let relative = if anchor == Utf8Path::new(".") {
        dir.to_path_buf()
    } else {
        dir.strip_prefix(&anchor)
            .map_err(|_| io::Error::other("failed to strip anchor from directory path"))?
            .to_path_buf()
    };
    let handle = fs_utf8::Dir::open_ambient_dir(&anchor, ambient_authority())?;
    Ok((handle, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::io::Write;
    use tempfile::TempDir;

    #[fixture]
    fn tmp() -> TempDir {
        TempDir::new().expect("tempdir")
    }

    fn utf8(dir: &TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf-8 temp path")
    }

    #[rstest]
    fn creates_missing_file_and_parents(tmp: TempDir) {
        let path = utf8(&tmp, "nested/deeper/out.csv");
        let target = open_append(&path).expect("open for append");
        assert!(target.was_empty);
        assert!(path.is_file());
    }

    #[rstest]
    fn appends_without_truncating(tmp: TempDir) {
        let path = utf8(&tmp, "out.csv");
        std::fs::write(&path, "first\n").expect("seed file");

        let mut target = open_append(&path).expect("open for append");
        assert!(!target.was_empty);
        target.file.write_all(b"second\n").expect("append");
        drop(target);

        let contents = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(contents, "first\nsecond\n");
    }

    #[rstest]
    fn reports_existing_empty_file(tmp: TempDir) {
        let path = utf8(&tmp, "empty.csv");
        std::fs::write(&path, "").expect("seed empty file");
        let target = open_append(&path).expect("open for append");
        assert!(target.was_empty);
    }

    #[rstest]
    fn rejects_directory_target(tmp: TempDir) {
        let path = utf8(&tmp, "dir.csv");
        std::fs::create_dir(&path).expect("create directory");
        assert!(open_append(&path).is_err());
    }
}
