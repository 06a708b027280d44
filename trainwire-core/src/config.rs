//! Settings that are not filesystem roots.
//!
//! Uses `figment` for layered configuration: defaults -> `trainwire.toml`
//! in the bootstrap root -> `TRAINWIRE_`-prefixed environment variables.
//! Path roots are resolved separately by [`crate::bootstrap`].

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Name of the settings file looked up in the bootstrap root.
pub const CONFIG_FILE: &str = "trainwire.toml";

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainwireConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub callbacks: CallbackConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default stderr filter when no `-v`/`-q` flag is given.
    #[serde(default = "default_level")]
    pub level: String,
    /// Also write JSON logs to a daily-rolled file.
    #[serde(default = "default_true")]
    pub json_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json_file: true,
        }
    }
}

/// How the standard epoch observers are wired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackConfig {
    /// Metric watched by the best-checkpoint observer. Lower is better.
    #[serde(default = "default_monitor")]
    pub monitor: String,
    /// Label embedded in best-checkpoint file names.
    #[serde(default = "default_metric_label")]
    pub metric_label: String,
    /// Significant digits of the metric value in best-checkpoint names.
    #[serde(default = "default_precision")]
    pub precision: usize,
    /// File name of the rolling checkpoint.
    #[serde(default = "default_last_checkpoint")]
    pub last_checkpoint: String,
    /// Where per-epoch scalars go.
    #[serde(default)]
    pub sink: SummarySink,
    /// File name of the JSONL scalar log inside the summary directory.
    #[serde(default = "default_summary_file")]
    pub summary_file: String,
    /// Reload the best weights when training ends.
    #[serde(default = "default_true")]
    pub restore_best: bool,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            monitor: default_monitor(),
            metric_label: default_metric_label(),
            precision: default_precision(),
            last_checkpoint: default_last_checkpoint(),
            sink: SummarySink::default(),
            summary_file: default_summary_file(),
            restore_best: true,
        }
    }
}

/// Scalar sink used by the metric logger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySink {
    /// TensorBoard event files, viewable with `tensorboard --logdir`.
    #[default]
    TensorBoard,
    /// One JSON object per line in `summary_file`.
    Jsonl,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_monitor() -> String {
    "val_loss".to_string()
}

fn default_metric_label() -> String {
    "mse".to_string()
}

fn default_precision() -> usize {
    2
}

fn default_last_checkpoint() -> String {
    "last_epoch.ckpt".to_string()
}

fn default_summary_file() -> String {
    "scalars.jsonl".to_string()
}

fn default_true() -> bool {
    true
}

impl TrainwireConfig {
    /// Load from layered sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (`TRAINWIRE_CALLBACKS__MONITOR`, ...)
    /// 2. `<root>/trainwire.toml`
    /// 3. Built-in defaults
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let file = root.join(CONFIG_FILE);
        if file.exists() {
            figment = figment.merge(Toml::file(&file));
        }

        figment = figment.merge(Env::prefixed("TRAINWIRE_").split("__"));

        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cb = &self.callbacks;
        if cb.monitor.trim().is_empty() {
            return Err(ConfigError::Validation(
                "callbacks.monitor must not be empty".into(),
            ));
        }
        if !(1..=17).contains(&cb.precision) {
            return Err(ConfigError::Validation(
                "callbacks.precision must be in [1, 17]".into(),
            ));
        }
        for (key, name) in [
            ("callbacks.last_checkpoint", &cb.last_checkpoint),
            ("callbacks.summary_file", &cb.summary_file),
            ("callbacks.metric_label", &cb.metric_label),
        ] {
            if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0'])
            {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a plain file name, got {name:?}"
                )));
            }
        }
        Ok(())
    }

    /// Render the defaults as TOML, for seeding a `trainwire.toml`.
    pub fn default_toml() -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }
}
