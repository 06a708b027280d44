//! Training metrics tracking.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::MlError;

/// Scalar metrics reported for one epoch, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    values: BTreeMap<String, f64>,
}

impl EpochMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Training metrics for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub epochs_completed: usize,
    pub loss_history: Vec<f64>,
    pub val_loss_history: Vec<f64>,
    pub custom_metrics: HashMap<String, Vec<f64>>,
    pub best_epoch: Option<usize>,
    pub best_loss: Option<f64>,
}

impl TrainingMetrics {
    pub fn record_epoch(&mut self, loss: f64, val_loss: Option<f64>) {
        self.loss_history.push(loss);
        if let Some(vl) = val_loss {
            self.val_loss_history.push(vl);
        }
        self.epochs_completed += 1;

        let check_loss = val_loss.unwrap_or(loss);
        let improved = match self.best_loss {
            None => !check_loss.is_nan(),
            Some(best) => check_loss < best,
        };
        if improved {
            self.best_loss = Some(check_loss);
            self.best_epoch = Some(self.epochs_completed);
        }
    }

    /// Record everything in `metrics`. `loss` and `val_loss` go to their own
    /// histories, the rest to `custom_metrics`.
    pub fn record(&mut self, metrics: &EpochMetrics) {
        for (name, value) in metrics.iter() {
            if name != "loss" && name != "val_loss" {
                self.add_custom_metric(name, value);
            }
        }
        let loss = metrics.get("loss").unwrap_or(f64::NAN);
        self.record_epoch(loss, metrics.get("val_loss"));
    }

    pub fn add_custom_metric(&mut self, name: &str, value: f64) {
        self.custom_metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }
}

/// Mean squared error over two equally sized slices.
pub fn mse(pred: &[f64], target: &[f64]) -> Result<f64, MlError> {
    if pred.len() != target.len() {
        return Err(MlError::ShapeMismatch(format!(
            "prediction has {} values, target has {}",
            pred.len(),
            target.len()
        )));
    }
    if pred.is_empty() {
        return Err(MlError::ShapeMismatch("empty input".into()));
    }
    let sum: f64 = pred
        .iter()
        .zip(target)
        .map(|(p, t)| (p - t) * (p - t))
        .sum();
    Ok(sum / pred.len() as f64)
}

type SliceMetric = fn(&[f64], &[f64]) -> Result<f64, MlError>;

/// Adapts a slice metric to batched (nested) inputs by flattening both
/// sides first. Named `f_<inner>`.
#[derive(Debug, Clone)]
pub struct FlattenedMetric {
    name: String,
    inner: SliceMetric,
}

impl FlattenedMetric {
    pub fn new(inner_name: &str, inner: SliceMetric) -> Self {
        Self {
            name: format!("f_{inner_name}"),
            inner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn compute<P, T>(&self, pred: &[P], target: &[T]) -> Result<f64, MlError>
    where
        P: AsRef<[f64]>,
        T: AsRef<[f64]>,
    {
        let flat_pred: Vec<f64> = pred.iter().flat_map(|row| row.as_ref()).copied().collect();
        let flat_target: Vec<f64> = target
            .iter()
            .flat_map(|row| row.as_ref())
            .copied()
            .collect();
        (self.inner)(&flat_pred, &flat_target)
    }
}
