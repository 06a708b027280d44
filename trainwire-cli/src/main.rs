//! Trainwire CLI: resolve experiment paths and drive epoch callbacks from
//! the terminal.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use trainwire_core::{Bootstrap, ProcessEnv, TrainwireConfig};

/// Trainwire: checkpoint and summary plumbing for training experiments
#[derive(Parser, Debug)]
#[command(name = "trainwire", version, about, long_about = None)]
struct Cli {
    /// Root directory holding `.env` and `trainwire.toml` (defaults to the executable's directory)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Show the resolved data, summary and checkpoint roots
    Paths,
    /// Create an experiment's directories and list its callbacks
    Prepare {
        /// Experiment name
        experiment: String,
    },
    /// Drive the callbacks through a scripted run
    Simulate {
        /// Experiment name
        experiment: String,
        /// Validation loss per epoch, comma separated
        #[arg(long = "val-loss", value_delimiter = ',', required = true, allow_hyphen_values = true)]
        val_loss: Vec<f64>,
        /// Training loss per epoch, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        loss: Vec<f64>,
    },
    /// Remove an experiment's outputs
    Clean {
        /// Experiment name
        experiment: String,
        /// Only remove the summary directory
        #[arg(long, conflicts_with = "checkpoints")]
        summary: bool,
        /// Only remove the checkpoint directory
        #[arg(long)]
        checkpoints: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Write a default trainwire.toml into the root
    Init,
    /// Print the effective configuration
    Show,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let bootstrap = match &cli.root {
        Some(root) => Bootstrap::new(root),
        None => Bootstrap::from_executable()?,
    };

    // Overrides first so TRAINWIRE_* entries in `.env` reach the config layer.
    let overrides_loaded = bootstrap.load_overrides()?;
    let config = TrainwireConfig::load(bootstrap.root())
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let filter = match cli.verbose {
        0 if cli.quiet => "error".to_string(),
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let mut _guard = None;
    let json_layer = if config.logging.json_file {
        let log_dir = directories::ProjectDirs::from("dev", "trainwire", "trainwire")
            .map(|d| d.data_dir().join("logs"))
            .unwrap_or_else(|| PathBuf::from("."));
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "trainwire.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        _guard = Some(guard);
        Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new("debug")),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    if overrides_loaded {
        tracing::info!(path = %bootstrap.override_file().display(), "Loaded environment overrides");
    }

    let paths = bootstrap.resolve_paths(&ProcessEnv)?;
    paths.ensure_directories()?;
    tracing::debug!(
        data = %paths.data.display(),
        summary = %paths.summary.display(),
        checkpoints = %paths.checkpoints.display(),
        "Paths resolved"
    );

    let ctx = commands::Context {
        bootstrap,
        paths,
        config,
    };
    commands::handle_command(cli.command, &ctx)
}
