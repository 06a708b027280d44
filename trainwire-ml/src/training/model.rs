//! A serde-backed parameter vector implementing [`Checkpointable`].
//!
//! Stands in for a framework model in the CLI and in tests.

use std::path::Path;

use serde::{Deserialize, Serialize};
use trainwire_core::persistence::{atomic_write_json, load_json};

use crate::error::MlError;
use crate::training::checkpoint::Checkpointable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterVector {
    pub weights: Vec<f64>,
    /// Epoch that produced these weights; 0 before training.
    pub epoch: usize,
}

impl ParameterVector {
    pub fn zeros(len: usize) -> Self {
        Self {
            weights: vec![0.0; len],
            epoch: 0,
        }
    }

    /// Deterministic update: weight `i` becomes `signal * (i + 1)`.
    pub fn step(&mut self, epoch: usize, signal: f64) {
        self.epoch = epoch;
        for (i, w) in self.weights.iter_mut().enumerate() {
            *w = signal * (i as f64 + 1.0);
        }
    }
}

impl Checkpointable for ParameterVector {
    fn save_checkpoint(&self, path: &Path) -> Result<(), MlError> {
        atomic_write_json(path, self)?;
        Ok(())
    }

    fn load_checkpoint(&mut self, path: &Path) -> Result<(), MlError> {
        let state: Self =
            load_json(path)?.ok_or_else(|| MlError::checkpoint(path, "checkpoint not found"))?;
        *self = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("last_epoch.ckpt");
        let mut model = ParameterVector::zeros(3);
        model.step(2, 0.5);
        model.save_checkpoint(&path).unwrap();

        let mut restored = ParameterVector::zeros(1);
        restored.load_checkpoint(&path).unwrap();
        assert_eq!(restored, model);
        assert_eq!(restored.weights, vec![0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_load_missing_checkpoint() {
        let tmp = TempDir::new().unwrap();
        let mut model = ParameterVector::zeros(1);
        let err = model
            .load_checkpoint(&tmp.path().join("absent.ckpt"))
            .unwrap_err();
        assert!(matches!(err, MlError::Checkpoint { .. }));
    }

    #[test]
    fn test_load_corrupt_checkpoint() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.ckpt");
        std::fs::write(&path, b"{not json").unwrap();
        let mut model = ParameterVector::zeros(1);
        assert!(matches!(
            model.load_checkpoint(&path),
            Err(MlError::Io(_))
        ));
    }
}
