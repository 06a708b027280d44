//! Epoch observers: rolling checkpoint, best checkpoint, metric logger.
//!
//! The training loop owns the model and calls the hooks of an
//! [`ObserverList`] in order. Observers share nothing beyond the
//! directories they write into.

use std::fmt;
use std::path::{Path, PathBuf};

use trainwire_core::CallbackConfig;

use crate::error::MlError;
use crate::training::checkpoint::{Checkpointable, best_checkpoint_name};
use crate::training::metrics::EpochMetrics;
use crate::training::summary::ScalarWriter;

/// Trait for training-lifecycle observers.
pub trait EpochObserver: Send {
    fn name(&self) -> &'static str;

    fn on_train_begin(&mut self) -> Result<(), MlError> {
        Ok(())
    }

    fn on_epoch_begin(&mut self, _epoch: usize) -> Result<(), MlError> {
        Ok(())
    }

    /// Called at the end of each epoch with the epoch number, that epoch's
    /// metrics, and the live model.
    fn on_epoch_end(
        &mut self,
        epoch: usize,
        metrics: &EpochMetrics,
        model: &mut dyn Checkpointable,
    ) -> Result<(), MlError>;

    fn on_train_end(&mut self, _model: &mut dyn Checkpointable) -> Result<(), MlError> {
        Ok(())
    }
}

/// Ordered observers. Every hook runs them in insertion order and stops at
/// the first error.
#[derive(Default)]
pub struct ObserverList {
    observers: Vec<Box<dyn EpochObserver>>,
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, observer: impl EpochObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.observers.iter().map(|o| o.name()).collect()
    }

    pub fn on_train_begin(&mut self) -> Result<(), MlError> {
        self.observers.iter_mut().try_for_each(|o| o.on_train_begin())
    }

    pub fn on_epoch_begin(&mut self, epoch: usize) -> Result<(), MlError> {
        self.observers
            .iter_mut()
            .try_for_each(|o| o.on_epoch_begin(epoch))
    }

    pub fn on_epoch_end(
        &mut self,
        epoch: usize,
        metrics: &EpochMetrics,
        model: &mut dyn Checkpointable,
    ) -> Result<(), MlError> {
        for observer in &mut self.observers {
            observer.on_epoch_end(epoch, metrics, model).inspect_err(|e| {
                tracing::error!(observer = observer.name(), epoch, error = %e, "Observer failed");
            })?;
        }
        Ok(())
    }

    pub fn on_train_end(&mut self, model: &mut dyn Checkpointable) -> Result<(), MlError> {
        for observer in &mut self.observers {
            observer.on_train_end(model)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Overwrites one fixed-name checkpoint after every epoch, so an
/// interrupted run can resume from its latest epoch.
#[derive(Debug, Clone)]
pub struct RollingCheckpoint {
    path: PathBuf,
    writes: usize,
}

impl RollingCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writes: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of times the checkpoint has been written this run.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl EpochObserver for RollingCheckpoint {
    fn name(&self) -> &'static str {
        "rolling_checkpoint"
    }

    fn on_epoch_end(
        &mut self,
        epoch: usize,
        _metrics: &EpochMetrics,
        model: &mut dyn Checkpointable,
    ) -> Result<(), MlError> {
        model.save_checkpoint(&self.path)?;
        self.writes += 1;
        tracing::debug!(epoch, path = %self.path.display(), "Saved last-epoch checkpoint");
        Ok(())
    }
}

/// Best value seen so far by a [`BestCheckpoint`].
#[derive(Debug, Clone, PartialEq)]
pub enum BestState {
    NoBestYet,
    HasBest {
        value: f64,
        epoch: usize,
        path: PathBuf,
    },
}

/// Writes a new checkpoint whenever the monitored metric strictly improves
/// (lower is better), then reloads those weights into the live model.
///
/// The best value lives in memory only; every run starts at
/// [`BestState::NoBestYet`].
#[derive(Debug, Clone)]
pub struct BestCheckpoint {
    dir: PathBuf,
    monitor: String,
    label: String,
    precision: usize,
    restore_best: bool,
    state: BestState,
    last_epoch: Option<usize>,
    saved: Vec<PathBuf>,
}

impl BestCheckpoint {
    pub fn new(dir: impl Into<PathBuf>, monitor: &str, label: &str) -> Self {
        Self {
            dir: dir.into(),
            monitor: monitor.to_string(),
            label: label.to_string(),
            precision: 2,
            restore_best: true,
            state: BestState::NoBestYet,
            last_epoch: None,
            saved: Vec::new(),
        }
    }

    pub fn from_config(dir: impl Into<PathBuf>, config: &CallbackConfig) -> Self {
        Self::new(dir, &config.monitor, &config.metric_label)
            .with_precision(config.precision)
            .with_restore_best(config.restore_best)
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Reload the best weights at train end if the last epoch was not the best.
    pub fn with_restore_best(mut self, restore: bool) -> Self {
        self.restore_best = restore;
        self
    }

    pub fn state(&self) -> &BestState {
        &self.state
    }

    pub fn best_value(&self) -> Option<f64> {
        match self.state {
            BestState::NoBestYet => None,
            BestState::HasBest { value, .. } => Some(value),
        }
    }

    /// Every checkpoint written this run, oldest first.
    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }

    fn is_improvement(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        match &self.state {
            BestState::NoBestYet => true,
            BestState::HasBest { value: best, .. } => value < *best,
        }
    }
}

impl EpochObserver for BestCheckpoint {
    fn name(&self) -> &'static str {
        "best_checkpoint"
    }

    fn on_epoch_end(
        &mut self,
        epoch: usize,
        metrics: &EpochMetrics,
        model: &mut dyn Checkpointable,
    ) -> Result<(), MlError> {
        let value = metrics
            .get(&self.monitor)
            .ok_or_else(|| MlError::MissingMetric {
                name: self.monitor.clone(),
                epoch,
            })?;
        self.last_epoch = Some(epoch);

        if !self.is_improvement(value) {
            tracing::debug!(epoch, monitor = %self.monitor, value, best = ?self.best_value(), "No improvement");
            return Ok(());
        }

        let path = self
            .dir
            .join(best_checkpoint_name(epoch, &self.label, value, self.precision));
        model.save_checkpoint(&path)?;
        model.load_checkpoint(&path)?;

        tracing::info!(
            epoch,
            monitor = %self.monitor,
            value,
            previous = ?self.best_value(),
            path = %path.display(),
            "New best checkpoint"
        );
        self.saved.push(path.clone());
        self.state = BestState::HasBest { value, epoch, path };
        Ok(())
    }

    fn on_train_end(&mut self, model: &mut dyn Checkpointable) -> Result<(), MlError> {
        if !self.restore_best {
            return Ok(());
        }
        if let BestState::HasBest { epoch, path, .. } = &self.state {
            if self.last_epoch != Some(*epoch) {
                tracing::info!(epoch, path = %path.display(), "Restoring best weights");
                model.load_checkpoint(path)?;
            }
        }
        Ok(())
    }
}

/// Streams every epoch metric to a [`ScalarWriter`], using the epoch as
/// the step.
pub struct MetricLogger {
    writer: Box<dyn ScalarWriter>,
}

impl MetricLogger {
    pub fn new(writer: impl ScalarWriter + 'static) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }
}

impl EpochObserver for MetricLogger {
    fn name(&self) -> &'static str {
        "metric_logger"
    }

    fn on_epoch_end(
        &mut self,
        epoch: usize,
        metrics: &EpochMetrics,
        _model: &mut dyn Checkpointable,
    ) -> Result<(), MlError> {
        for (tag, value) in metrics.iter() {
            self.writer.add_scalar(tag, value, epoch)?;
        }
        self.writer.flush()?;
        tracing::info!(epoch, metrics = ?metrics, "Epoch complete");
        Ok(())
    }

    fn on_train_end(&mut self, _model: &mut dyn Checkpointable) -> Result<(), MlError> {
        self.writer.flush()
    }
}

impl fmt::Debug for MetricLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricLogger").finish_non_exhaustive()
    }
}
