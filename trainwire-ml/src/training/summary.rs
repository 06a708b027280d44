//! Scalar sinks for per-epoch metrics.
//!
//! [`TensorBoardScalarWriter`] writes TensorBoard event files into the
//! summary directory, viewable with `tensorboard --logdir <summary_root>`.
//!
//! [`JsonlScalarWriter`] appends one JSON object per line:
//!
//! ```json
//! {"tag":"val_loss","value":4.5,"step":3,"wall_time":"2026-01-01T12:00:00Z"}
//! ```
//!
//! The file is opened in append mode so a resumed run keeps its history.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tensorboard_rs::summary_writer::SummaryWriter;
use trainwire_core::ensure_dir;

use crate::error::MlError;

/// Accepts `(tag, value, step)` triples.
pub trait ScalarWriter: Send {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<(), MlError>;
    fn flush(&mut self) -> Result<(), MlError>;
}

/// One line of a scalar log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRecord {
    pub tag: String,
    /// `None` for NaN and infinities, which JSON cannot carry.
    pub value: Option<f64>,
    pub step: usize,
    pub wall_time: String,
}

/// JSONL scalar log rooted in a summary directory.
pub struct JsonlScalarWriter {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl JsonlScalarWriter {
    /// Open (or create) `<dir>/<file_name>` for appending.
    pub fn open(dir: &Path, file_name: &str) -> Result<Self, MlError> {
        let path = dir.join(file_name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record of a scalar log.
    pub fn read_records(path: &Path) -> Result<Vec<ScalarRecord>, MlError> {
        let content = std::fs::read_to_string(path)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(MlError::from))
            .collect()
    }
}

impl ScalarWriter for JsonlScalarWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<(), MlError> {
        let record = ScalarRecord {
            tag: tag.to_string(),
            value: value.is_finite().then_some(value),
            step,
            wall_time: chrono::Utc::now().to_rfc3339(),
        };
        let line = serde_json::to_string(&record)?;
        writeln!(self.writer, "{line}")
            .map_err(|e| MlError::summary(format!("{}: {e}", self.path.display())))
    }

    fn flush(&mut self) -> Result<(), MlError> {
        self.writer
            .flush()
            .map_err(|e| MlError::summary(format!("{}: {e}", self.path.display())))
    }
}

impl std::fmt::Debug for JsonlScalarWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlScalarWriter")
            .field("path", &self.path)
            .finish()
    }
}

/// TensorBoard event-file writer rooted in a summary directory.
pub struct TensorBoardScalarWriter {
    writer: SummaryWriter,
    log_dir: PathBuf,
}

impl TensorBoardScalarWriter {
    /// Start a new event file in `log_dir`, creating the directory if needed.
    pub fn open(log_dir: &Path) -> Result<Self, MlError> {
        ensure_dir(log_dir)?;
        let writer = SummaryWriter::new(&log_dir.display().to_string());
        Ok(Self {
            writer,
            log_dir: log_dir.to_path_buf(),
        })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

impl ScalarWriter for TensorBoardScalarWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<(), MlError> {
        self.writer.add_scalar(tag, value as f32, step);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), MlError> {
        self.writer.flush();
        Ok(())
    }
}

impl std::fmt::Debug for TensorBoardScalarWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TensorBoardScalarWriter")
            .field("log_dir", &self.log_dir)
            .finish_non_exhaustive()
    }
}
