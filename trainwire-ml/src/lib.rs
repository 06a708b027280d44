//! # trainwire-ml
//!
//! Epoch observers for a training loop: a rolling "last epoch" checkpoint,
//! a best-so-far checkpoint keyed on a monitored metric, and a JSONL scalar
//! log. [`build_callbacks`] wires all three for one named experiment under
//! the roots resolved by `trainwire-core`.
//!
//! ```no_run
//! use trainwire_core::{Bootstrap, CallbackConfig};
//! use trainwire_ml::build_callbacks;
//!
//! let paths = Bootstrap::from_executable()?.run()?;
//! let set = build_callbacks(&paths, &CallbackConfig::default(), "run1")?;
//! assert_eq!(set.observers.len(), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod training;

pub use error::MlError;
pub use training::{
    BestCheckpoint, CallbackSet, Checkpointable, EpochMetrics, EpochObserver, MetricLogger,
    ObserverList, ParameterVector, RollingCheckpoint, TrainingMetrics, TrainingRunner,
    build_callbacks,
};
