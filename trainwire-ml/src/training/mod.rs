//! Training hooks: observers, checkpoint naming, metrics, scalar logs.

pub mod assembler;
pub mod callbacks;
pub mod checkpoint;
pub mod metrics;
pub mod model;
pub mod runner;
pub mod summary;

pub use assembler::{CallbackSet, ExperimentDirectories, build_callbacks, validate_experiment_name};
pub use callbacks::{
    BestCheckpoint, BestState, EpochObserver, MetricLogger, ObserverList, RollingCheckpoint,
};
pub use checkpoint::{Checkpointable, best_checkpoint_name, format_metric};
pub use metrics::{EpochMetrics, FlattenedMetric, TrainingMetrics, mse};
pub use model::ParameterVector;
pub use runner::TrainingRunner;
pub use summary::{JsonlScalarWriter, ScalarRecord, ScalarWriter, TensorBoardScalarWriter};
