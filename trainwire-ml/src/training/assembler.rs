//! Callback assembly for one experiment.
//!
//! Given the resolved roots and an experiment name, derive the
//! experiment's summary and checkpoint directories, create them, and build
//! the standard observers in a fixed order:
//!
//! 1. [`RollingCheckpoint`] writing `<checkpoint_dir>/last_epoch.ckpt`
//! 2. [`BestCheckpoint`] writing `<checkpoint_dir>/best_epoch_<N>_mse_<V>.ckpt`
//! 3. [`MetricLogger`] writing TensorBoard event files into `<summary_dir>`,
//!    or `<summary_dir>/scalars.jsonl` when the JSONL sink is configured
//!
//! Calling it again for the same name is safe; that is how a run resumes.

use std::path::{Path, PathBuf};

use trainwire_core::{CallbackConfig, ResolvedPaths, SummarySink, ensure_dir};

use crate::error::MlError;
use crate::training::callbacks::{BestCheckpoint, MetricLogger, ObserverList, RollingCheckpoint};
use crate::training::summary::{JsonlScalarWriter, TensorBoardScalarWriter};

/// Reject names that could escape the summary or checkpoint roots.
pub fn validate_experiment_name(name: &str) -> Result<(), MlError> {
    if name.trim().is_empty() {
        return Err(MlError::invalid_name(name, "must not be empty"));
    }
    if name == "." || name.contains("..") {
        return Err(MlError::invalid_name(name, "must not contain '.' or '..' segments"));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(MlError::invalid_name(
            name,
            "must not contain path separators or NUL",
        ));
    }
    Ok(())
}

/// Per-experiment output directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentDirectories {
    pub summary_dir: PathBuf,
    pub checkpoint_dir: PathBuf,
}

impl ExperimentDirectories {
    pub fn new(paths: &ResolvedPaths, experiment: &str) -> Result<Self, MlError> {
        validate_experiment_name(experiment)?;
        Ok(Self {
            summary_dir: paths.summary.join(experiment),
            checkpoint_dir: paths.checkpoints.join(experiment),
        })
    }

    /// Create both directories and their parents. Idempotent.
    pub fn create(&self) -> Result<(), MlError> {
        ensure_dir(&self.summary_dir)?;
        ensure_dir(&self.checkpoint_dir)?;
        Ok(())
    }
}

/// Observers plus the directories they write into.
#[derive(Debug)]
pub struct CallbackSet {
    pub observers: ObserverList,
    pub summary_dir: PathBuf,
    pub checkpoint_dir: PathBuf,
}

impl CallbackSet {
    pub fn summary_dir(&self) -> &Path {
        &self.summary_dir
    }

    pub fn checkpoint_dir(&self) -> &Path {
        &self.checkpoint_dir
    }
}

/// Build the standard observers for `experiment`.
///
/// Nothing is returned unless every directory and observer was set up.
pub fn build_callbacks(
    paths: &ResolvedPaths,
    config: &CallbackConfig,
    experiment: &str,
) -> Result<CallbackSet, MlError> {
    let dirs = ExperimentDirectories::new(paths, experiment)?;
    dirs.create()?;

    let logger = match config.sink {
        SummarySink::TensorBoard => {
            MetricLogger::new(TensorBoardScalarWriter::open(&dirs.summary_dir)?)
        }
        SummarySink::Jsonl => MetricLogger::new(JsonlScalarWriter::open(
            &dirs.summary_dir,
            &config.summary_file,
        )?),
    };

    let mut observers = ObserverList::new();
    observers.push(RollingCheckpoint::new(
        dirs.checkpoint_dir.join(&config.last_checkpoint),
    ));
    observers.push(BestCheckpoint::from_config(&dirs.checkpoint_dir, config));
    observers.push(logger);

    tracing::info!(
        experiment,
        sink = ?config.sink,
        summary_dir = %dirs.summary_dir.display(),
        checkpoint_dir = %dirs.checkpoint_dir.display(),
        observers = ?observers.names(),
        "Callbacks assembled"
    );

    Ok(CallbackSet {
        observers,
        summary_dir: dirs.summary_dir,
        checkpoint_dir: dirs.checkpoint_dir,
    })
}
