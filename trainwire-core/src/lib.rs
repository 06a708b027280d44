//! # Trainwire Core
//!
//! Startup plumbing for training experiments: an optional `.env` override
//! file, lazily evaluated environment variables, the data / summary /
//! checkpoint roots derived from them, and the layered settings file.
//!
//! ```no_run
//! use trainwire_core::Bootstrap;
//!
//! let paths = Bootstrap::from_executable()?.run()?;
//! println!("checkpoints go to {}", paths.checkpoints.display());
//! # Ok::<(), trainwire_core::BootstrapError>(())
//! ```

pub mod bootstrap;
pub mod config;
pub mod env;
pub mod error;
pub mod fs;
pub mod persistence;

pub use bootstrap::{Bootstrap, ResolvedPaths};
pub use config::{CallbackConfig, LoggingConfig, SummarySink, TrainwireConfig};
pub use env::{EnvSource, LazyEnv, ProcessEnv};
pub use error::{BootstrapError, ConfigError, FilesystemError};
pub use fs::{Removed, ensure_dir, remove_path};
