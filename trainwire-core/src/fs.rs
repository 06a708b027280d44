//! Directory creation and best-effort removal.

use std::path::Path;

use walkdir::WalkDir;

use crate::error::FilesystemError;

/// What [`remove_path`] found and removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removed {
    /// A directory tree holding this many entries (the root included).
    Directory { entries: usize },
    File,
    Nothing,
}

/// Create `path` and any missing parents. Idempotent.
pub fn ensure_dir(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() && !path.is_dir() {
        return Err(FilesystemError::NotADirectory(path.to_path_buf()));
    }
    std::fs::create_dir_all(path).map_err(|source| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove a directory tree, a file, or a symlink at `path`.
///
/// Symlinks are unlinked, never followed. A missing path is not an error.
pub fn remove_path(path: &Path) -> Result<Removed, FilesystemError> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Removed::Nothing),
        Err(source) => {
            return Err(FilesystemError::Remove {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let to_remove_err = |source| FilesystemError::Remove {
        path: path.to_path_buf(),
        source,
    };

    if metadata.is_dir() {
        let entries = WalkDir::new(path).into_iter().filter_map(Result::ok).count();
        std::fs::remove_dir_all(path).map_err(to_remove_err)?;
        tracing::info!(path = %path.display(), entries, "Erased directory recursively");
        Ok(Removed::Directory { entries })
    } else {
        std::fs::remove_file(path).map_err(to_remove_err)?;
        tracing::info!(path = %path.display(), "Erased file");
        Ok(Removed::File)
    }
}
