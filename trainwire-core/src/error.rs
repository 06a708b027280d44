//! Error types for the Trainwire core.
//!
//! Uses `thiserror` for structured variants covering environment resolution,
//! filesystem setup, and layered configuration. Nothing in this layer is
//! recovered silently: every variant is meant to abort startup.

use std::path::PathBuf;

/// Errors raised while bootstrapping paths from the environment.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Cannot convert {name}={value:?}: {reason}")]
    Conversion {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Environment variable {0} is not set and has no default")]
    MissingVariable(String),

    #[error("Failed to load override file {path}: {source}")]
    Overrides {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[error("Cannot locate the running executable: {0}")]
    Executable(#[source] std::io::Error),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),
}

/// Errors from directory creation, removal, and checkpoint writes.
#[derive(Debug, thiserror::Error)]
pub enum FilesystemError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Expected a directory but found a file: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors from the layered settings file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Config validation error: {0}")]
    Validation(String),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

impl FilesystemError {
    /// The path the failed operation was acting on.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::CreateDir { path, .. }
            | Self::Remove { path, .. }
            | Self::Write { path, .. }
            | Self::NotADirectory(path) => path,
        }
    }
}
