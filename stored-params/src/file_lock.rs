//! Cross-process locking and atomic replacement for single-document stores.
//!
//! Writers hold an exclusive advisory lock on a `<file>.lock` sidecar for the
//! whole read-modify-write cycle, so stores opened on the same path (in this
//! process or another) never lose each other's updates. Readers take no lock:
//! the document is replaced by rename, so they see either the old or the new
//! version in full.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use fs2::FileExt;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Exclusive lock on a document's sidecar file, released on drop.
pub(crate) struct FileLock {
    file: File,
}

impl FileLock {
    /// Block until the lock for `path` is held.
    ///
    /// Creates the parent directory and the sidecar file as needed.
    pub(crate) fn acquire(path: &Path) -> io::Result<Self> {
        ensure_parent(path)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(sidecar(path, "lock"))?;
        FileExt::lock_exclusive(&file)?;
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Closing the handle releases the lock as well.
        let _ = FileExt::unlock(&self.file);
    }
}

/// Replace the contents of `path` through a uniquely named temp file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    ensure_parent(path)?;
    let tmp = sidecar(
        path,
        &format!(
            "{}.{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ),
    );

    let result = std::fs::write(&tmp, contents).and_then(|()| std::fs::rename(&tmp, path));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// `dir/name.ext` → `dir/name.ext.{suffix}`
fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_names() {
        let path = Path::new("/data/prefs.json");
        assert_eq!(sidecar(path, "lock"), PathBuf::from("/data/prefs.json.lock"));
    }

    #[test]
    fn test_write_atomic_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("doc.json");

        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"two");

        let names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![OsString::from("doc.json")]);
    }

    #[test]
    fn test_lock_is_exclusive_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        let held = FileLock::acquire(&path).unwrap();
        let other_handle = OpenOptions::new()
            .read(true)
            .write(true)
            .open(sidecar(&path, "lock"))
            .unwrap();
        assert!(FileExt::try_lock_exclusive(&other_handle).is_err());

        drop(held);
        assert!(FileExt::try_lock_exclusive(&other_handle).is_ok());
        FileExt::unlock(&other_handle).unwrap();
    }
}
