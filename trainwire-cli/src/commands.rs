//! CLI subcommand handlers.

use std::path::Path;

use trainwire_core::{Bootstrap, ResolvedPaths, Removed, TrainwireConfig, remove_path};
use trainwire_ml::training::ExperimentDirectories;
use trainwire_ml::{EpochMetrics, ParameterVector, TrainingRunner, build_callbacks};

use crate::{Commands, ConfigAction};

/// Everything a handler needs after startup.
pub struct Context {
    pub bootstrap: Bootstrap,
    pub paths: ResolvedPaths,
    pub config: TrainwireConfig,
}

/// Handle a CLI subcommand.
pub fn handle_command(command: Commands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Commands::Paths => handle_paths(ctx),
        Commands::Prepare { experiment } => handle_prepare(ctx, &experiment),
        Commands::Simulate {
            experiment,
            val_loss,
            loss,
        } => handle_simulate(ctx, &experiment, &val_loss, &loss),
        Commands::Clean {
            experiment,
            summary,
            checkpoints,
        } => handle_clean(ctx, &experiment, summary, checkpoints),
        Commands::Config { action } => handle_config(action, ctx),
    }
}

fn handle_paths(ctx: &Context) -> anyhow::Result<()> {
    let overrides = ctx.bootstrap.override_file();
    println!("root:        {}", ctx.paths.root.display());
    println!(
        "overrides:   {}{}",
        overrides.display(),
        if overrides.is_file() { "" } else { " (absent)" }
    );
    println!("data:        {}", ctx.paths.data.display());
    println!("summary:     {}", ctx.paths.summary.display());
    println!("checkpoints: {}", ctx.paths.checkpoints.display());
    Ok(())
}

fn handle_prepare(ctx: &Context, experiment: &str) -> anyhow::Result<()> {
    let set = build_callbacks(&ctx.paths, &ctx.config.callbacks, experiment)?;
    println!("Experiment '{}' ready", experiment);
    println!("  summary:     {}", set.summary_dir.display());
    println!("  checkpoints: {}", set.checkpoint_dir.display());
    println!("  callbacks:   {}", set.observers.names().join(", "));
    Ok(())
}

fn handle_simulate(
    ctx: &Context,
    experiment: &str,
    val_loss: &[f64],
    loss: &[f64],
) -> anyhow::Result<()> {
    if !loss.is_empty() && loss.len() != val_loss.len() {
        anyhow::bail!(
            "--loss has {} values but --val-loss has {}",
            loss.len(),
            val_loss.len()
        );
    }

    let epochs: Vec<EpochMetrics> = val_loss
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let mut metrics = EpochMetrics::new().with("val_loss", v);
            if let Some(&l) = loss.get(i) {
                metrics.insert("loss", l);
            }
            metrics
        })
        .collect();

    let set = build_callbacks(&ctx.paths, &ctx.config.callbacks, experiment)?;
    let checkpoint_dir = set.checkpoint_dir.clone();
    let mut runner = TrainingRunner::new(set.observers);
    let mut model = ParameterVector::zeros(4);
    let history = runner.run(&mut model, epochs, |epoch, m, metrics| {
        m.step(epoch, metrics.get("val_loss").unwrap_or_default());
    })?;

    println!(
        "Ran {} epoch(s); best epoch {}",
        history.epochs_completed,
        history
            .best_epoch
            .map_or_else(|| "none".to_string(), |e| e.to_string())
    );
    println!("Model holds weights from epoch {}", model.epoch);
    for name in list_files(&checkpoint_dir)? {
        println!("  {}", name);
    }
    Ok(())
}

fn handle_clean(
    ctx: &Context,
    experiment: &str,
    summary_only: bool,
    checkpoints_only: bool,
) -> anyhow::Result<()> {
    let dirs = ExperimentDirectories::new(&ctx.paths, experiment)?;
    let mut targets = Vec::new();
    if !checkpoints_only {
        targets.push(dirs.summary_dir);
    }
    if !summary_only {
        targets.push(dirs.checkpoint_dir);
    }

    for target in targets {
        match remove_path(&target)? {
            Removed::Directory { entries } => {
                println!("Removed {} ({} entries)", target.display(), entries)
            }
            Removed::File => println!("Removed {}", target.display()),
            Removed::Nothing => println!("Nothing at {}", target.display()),
        }
    }
    Ok(())
}

fn handle_config(action: ConfigAction, ctx: &Context) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = ctx.bootstrap.root().join(trainwire_core::config::CONFIG_FILE);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            std::fs::write(&config_path, TrainwireConfig::default_toml()?)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&ctx.config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

fn list_files(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut names = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>, _>>()?;
    names.sort();
    Ok(names)
}
