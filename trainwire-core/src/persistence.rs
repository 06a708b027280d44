//! Atomic file writes.
//!
//! Checkpoints are written to a `.tmp` sibling and renamed over the target,
//! so a fixed-name checkpoint is replaced in place and a crash mid-write
//! never leaves a truncated file behind.

use std::path::{Path, PathBuf};

use crate::error::FilesystemError;

/// Atomically write JSON data to a file.
///
/// Creates parent directories if they don't exist.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<(), FilesystemError> {
    let json = serde_json::to_string_pretty(data).map_err(|e| FilesystemError::Write {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    })?;
    atomic_write(path, json.as_bytes())
}

/// Atomically write raw bytes to a file.
///
/// The target must name a file; `.` and `..` endings are rejected. The
/// temporary sibling is removed if the write or the rename fails.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), FilesystemError> {
    let to_write_err = |source| FilesystemError::Write {
        path: path.to_path_buf(),
        source,
    };
    let tmp = tmp_sibling(path)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(to_write_err)?;
    }
    let written = std::fs::write(&tmp, data).and_then(|()| std::fs::rename(&tmp, path));
    if let Err(source) = written {
        if let Err(e) = std::fs::remove_file(&tmp) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %tmp.display(), error = %e, "Failed to remove temporary file");
            }
        }
        return Err(to_write_err(source));
    }
    Ok(())
}

/// Load and deserialize JSON from a file.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> std::io::Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&data)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(Some(value))
}

// `with_extension` would turn `best_epoch_1_mse_4.5.ckpt` into
// `best_epoch_1_mse_4.tmp`, so append instead.
fn tmp_sibling(path: &Path) -> Result<PathBuf, FilesystemError> {
    let Some(file_name) = path.file_name() else {
        return Err(FilesystemError::Write {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "target has no file name",
            ),
        });
    };
    let mut name = file_name.to_os_string();
    name.push(".tmp");
    Ok(path.with_file_name(name))
}
