//! Minimal epoch driver.
//!
//! Real training loops live in the framework that owns the model. This
//! runner only sequences observer hooks around a caller-supplied epoch
//! step, which is enough for the CLI and for exercising observers.

use crate::error::MlError;
use crate::training::callbacks::ObserverList;
use crate::training::checkpoint::Checkpointable;
use crate::training::metrics::{EpochMetrics, TrainingMetrics};

/// Drives an [`ObserverList`] through a sequence of epochs.
#[derive(Debug)]
pub struct TrainingRunner {
    observers: ObserverList,
}

impl TrainingRunner {
    pub fn new(observers: ObserverList) -> Self {
        Self { observers }
    }

    pub fn observers(&self) -> &ObserverList {
        &self.observers
    }

    pub fn into_observers(self) -> ObserverList {
        self.observers
    }

    /// Run one epoch per entry of `epochs`, numbered from 1.
    ///
    /// `train_epoch` updates the model before the end-of-epoch hooks see
    /// it. The first observer error aborts the run; `on_train_end` only
    /// runs after the last epoch succeeds.
    pub fn run<M, I, F>(
        &mut self,
        model: &mut M,
        epochs: I,
        mut train_epoch: F,
    ) -> Result<TrainingMetrics, MlError>
    where
        M: Checkpointable,
        I: IntoIterator<Item = EpochMetrics>,
        F: FnMut(usize, &mut M, &EpochMetrics),
    {
        let mut history = TrainingMetrics::default();
        self.observers.on_train_begin()?;

        for (index, metrics) in epochs.into_iter().enumerate() {
            let epoch = index + 1;
            self.observers.on_epoch_begin(epoch)?;
            train_epoch(epoch, model, &metrics);
            history.record(&metrics);
            self.observers.on_epoch_end(epoch, &metrics, model)?;
        }

        self.observers.on_train_end(model)?;
        tracing::info!(
            epochs = history.epochs_completed,
            best_epoch = ?history.best_epoch,
            best_loss = ?history.best_loss,
            "Training finished"
        );
        Ok(history)
    }
}
