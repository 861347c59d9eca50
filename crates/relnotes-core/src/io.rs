use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically create `path` with `data` using a tempfile in the same
/// directory. Parent directories are created as needed. An existing file at
/// `path` is left alone and the call fails with `AlreadyExists`.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// NoteStore
// ---------------------------------------------------------------------------

/// Where rendered notes go. Both operations are idempotent for repeated
/// identical calls.
pub trait NoteStore {
    fn exists(&self, path: &Path) -> bool;
    fn write(&mut self, path: &Path, content: &str) -> Result<()>;
}

/// Notes on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl NoteStore for FsStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn write(&mut self, path: &Path, content: &str) -> Result<()> {
        atomic_write(path, content.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelnotesError;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("v1.0.0.md");
        atomic_write(&path, b"# notes").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# notes");
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acme/widgets/alpha/v0.1.0.md");
        atomic_write(&path, b"data").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn atomic_write_into_existing_parents() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("o/r")).unwrap();
        atomic_write(&dir.path().join("o/r/a.md"), b"a").unwrap();
        atomic_write(&dir.path().join("o/r/b.md"), b"b").unwrap();
        assert!(dir.path().join("o/r/b.md").exists());
    }

    #[test]
    fn atomic_write_never_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("v1.0.0.md");
        std::fs::write(&path, "hand edited").unwrap();
        let err = atomic_write(&path, b"regenerated").unwrap_err();
        assert!(
            matches!(err, RelnotesError::Io(ref e) if e.kind() == std::io::ErrorKind::AlreadyExists),
            "{err:?}"
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hand edited");
    }

    #[test]
    fn fs_store_reports_existence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("o/r/v1.md");
        let mut store = FsStore;
        assert!(!store.exists(&path));
        store.write(&path, "x").unwrap();
        assert!(store.exists(&path));
    }
}
