//! Configuration bootstrap: override file, path resolution, directory setup.
//!
//! Order matters. [`Bootstrap::load_overrides`] mutates the process
//! environment, and path variables are read when they are evaluated, so the
//! override file has to be loaded first. [`Bootstrap::run`] does the three
//! steps in the right order.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::env::{EnvSource, LazyEnv, ProcessEnv};
use crate::error::{BootstrapError, FilesystemError};
use crate::fs::ensure_dir;

/// Name of the override file, looked up in the bootstrap root.
pub const OVERRIDE_FILE: &str = ".env";

pub const PATH_DATA: &str = "PATH_DATA";
pub const PATH_SUMMARY: &str = "PATH_SUMMARY";
pub const PATH_CHECKPOINTS: &str = "PATH_CHECKPOINTS";

/// Filesystem roots resolved at startup. Read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPaths {
    pub root: PathBuf,
    pub data: PathBuf,
    pub summary: PathBuf,
    pub checkpoints: PathBuf,
}

impl ResolvedPaths {
    /// Create the summary and checkpoint roots. Idempotent.
    ///
    /// The data root is only a default anchor and is not created.
    pub fn ensure_directories(&self) -> Result<(), FilesystemError> {
        ensure_dir(&self.summary)?;
        ensure_dir(&self.checkpoints)?;
        Ok(())
    }
}

/// Resolves [`ResolvedPaths`] relative to a root directory.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    root: PathBuf,
}

impl Bootstrap {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root the bootstrap at the directory holding the running executable.
    pub fn from_executable() -> Result<Self, BootstrapError> {
        let exe = std::env::current_exe().map_err(BootstrapError::Executable)?;
        let root = exe
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn override_file(&self) -> PathBuf {
        self.root.join(OVERRIDE_FILE)
    }

    /// Inject `KEY=value` pairs from the override file into the process
    /// environment, replacing existing values.
    ///
    /// Returns `false` when there is no override file.
    pub fn load_overrides(&self) -> Result<bool, BootstrapError> {
        let path = self.override_file();
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "No override file");
            return Ok(false);
        }
        dotenvy::from_path_override(&path).map_err(|source| BootstrapError::Overrides {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Loaded environment overrides");
        Ok(true)
    }

    /// Resolve the data, summary and checkpoint roots from `env`.
    ///
    /// Nothing is created here, so a bad value fails before any directory
    /// exists.
    pub fn resolve_paths(&self, env: &dyn EnvSource) -> Result<ResolvedPaths, BootstrapError> {
        let data = LazyEnv::path(PATH_DATA)
            .default_value(default_under(&self.root, "data", PATH_DATA)?)
            .eval(env)?;

        // Declared after PATH_DATA resolves; their defaults hang off it.
        let summary = LazyEnv::path(PATH_SUMMARY)
            .default_value(default_under(&data, "summary", PATH_SUMMARY)?)
            .eval(env)?;
        let checkpoints = LazyEnv::path(PATH_CHECKPOINTS)
            .default_value(default_under(&data, "checkpoints", PATH_CHECKPOINTS)?)
            .eval(env)?;

        Ok(ResolvedPaths {
            root: self.root.clone(),
            data,
            summary,
            checkpoints,
        })
    }

    /// Load overrides, resolve against the process environment, and create
    /// the summary and checkpoint roots.
    pub fn run(&self) -> Result<ResolvedPaths, BootstrapError> {
        self.load_overrides()?;
        let paths = self.resolve_paths(&ProcessEnv)?;
        paths.ensure_directories()?;
        tracing::info!(
            data = %paths.data.display(),
            summary = %paths.summary.display(),
            checkpoints = %paths.checkpoints.display(),
            "Bootstrap complete"
        );
        Ok(paths)
    }
}

fn default_under(base: &Path, child: &str, name: &str) -> Result<String, BootstrapError> {
    let joined = base.join(child);
    joined
        .to_str()
        .map(str::to_owned)
        .ok_or_else(|| BootstrapError::Conversion {
            name: name.to_string(),
            value: joined.display().to_string(),
            reason: "default path is not valid unicode".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_hang_off_root() {
        let boot = Bootstrap::new("/opt/exp");
        let paths = boot.resolve_paths(&env(&[])).unwrap();
        assert_eq!(paths.data, PathBuf::from("/opt/exp/data"));
        assert_eq!(paths.summary, PathBuf::from("/opt/exp/data/summary"));
        assert_eq!(paths.checkpoints, PathBuf::from("/opt/exp/data/checkpoints"));
    }

    #[test]
    fn test_derived_defaults_follow_path_data() {
        let boot = Bootstrap::new("/opt/exp");
        let paths = boot
            .resolve_paths(&env(&[(PATH_DATA, "/mnt/big")]))
            .unwrap();
        assert_eq!(paths.summary, PathBuf::from("/mnt/big/summary"));
        assert_eq!(paths.checkpoints, PathBuf::from("/mnt/big/checkpoints"));
    }

    #[test]
    fn test_explicit_values_win() {
        let boot = Bootstrap::new("/opt/exp");
        let paths = boot
            .resolve_paths(&env(&[
                (PATH_SUMMARY, "/logs"),
                (PATH_CHECKPOINTS, "/tmp/ckpt"),
            ]))
            .unwrap();
        assert_eq!(paths.data, PathBuf::from("/opt/exp/data"));
        assert_eq!(paths.summary, PathBuf::from("/logs"));
        assert_eq!(paths.checkpoints, PathBuf::from("/tmp/ckpt"));
    }

    #[test]
    fn test_malformed_value_fails_before_any_directory() {
        let tmp = TempDir::new().unwrap();
        let boot = Bootstrap::new(tmp.path());
        let err = boot
            .resolve_paths(&env(&[(PATH_CHECKPOINTS, "")]))
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Conversion { ref name, .. } if name == PATH_CHECKPOINTS));
        assert!(!tmp.path().join("data").exists());
    }

    #[test]
    fn test_ensure_directories_idempotent() {
        let tmp = TempDir::new().unwrap();
        let boot = Bootstrap::new(tmp.path());
        let paths = boot.resolve_paths(&env(&[])).unwrap();
        paths.ensure_directories().unwrap();
        paths.ensure_directories().unwrap();
        assert!(paths.summary.is_dir());
        assert!(paths.checkpoints.is_dir());
    }

    #[test]
    fn test_ensure_directories_collision() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("ckpt");
        std::fs::write(&blocker, b"file").unwrap();
        let boot = Bootstrap::new(tmp.path());
        let paths = boot
            .resolve_paths(&env(&[(PATH_CHECKPOINTS, blocker.to_str().unwrap())]))
            .unwrap();
        assert!(matches!(
            paths.ensure_directories(),
            Err(FilesystemError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_missing_override_file_is_fine() {
        let tmp = TempDir::new().unwrap();
        assert!(!Bootstrap::new(tmp.path()).load_overrides().unwrap());
    }

    #[test]
    fn test_override_file_replaces_existing_value() {
        const KEY: &str = "TW_TEST_BOOTSTRAP_OVERRIDE";
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(OVERRIDE_FILE), format!("{KEY}=from_file\n")).unwrap();

        // SAFETY: the key is unique to this test.
        unsafe { std::env::set_var(KEY, "from_process") };

        let boot = Bootstrap::new(tmp.path());
        assert!(boot.load_overrides().unwrap());
        let value = LazyEnv::<String>::new(KEY).eval(&ProcessEnv).unwrap();
        assert_eq!(value, "from_file");
    }

    #[test]
    fn test_malformed_override_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(OVERRIDE_FILE), "TW_TEST_BAD='unterminated\n")
            .unwrap();
        let err = Bootstrap::new(tmp.path()).load_overrides().unwrap_err();
        assert!(matches!(err, BootstrapError::Overrides { .. }));
    }
}
