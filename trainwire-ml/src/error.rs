//! Error types for the trainwire-ml crate.

use std::path::PathBuf;

use thiserror::Error;
use trainwire_core::FilesystemError;

/// Top-level error type for callback assembly and observer hooks.
#[derive(Debug, Error)]
pub enum MlError {
    #[error("Invalid experiment name {name:?}: {reason}")]
    InvalidExperimentName { name: String, reason: String },

    #[error("Metric '{name}' missing at epoch {epoch}")]
    MissingMetric { name: String, epoch: usize },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Checkpoint error at {path}: {message}")]
    Checkpoint { path: PathBuf, message: String },

    #[error("Summary writer error: {0}")]
    Summary(String),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl MlError {
    pub fn checkpoint(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Checkpoint {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidExperimentName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn summary(msg: impl Into<String>) -> Self {
        Self::Summary(msg.into())
    }
}
