//! Command line driver for the local model store.
//!
//! # Responsibility
//! - Inspect and edit a model database from a shell.
//! - Keep output line-oriented for scripting.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use modelstore_core::config::STORE_DIR_ENV;
use modelstore_core::{
    core_version, default_log_level, init_logging, JsonUnitSerializer, LoadOutcome, LogNotifier,
    ModelUnit, SaveOutcome, StoreConfig, StoreManager, UnitRepository,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "modelstore", version, about = "Inspect and edit a local model store")]
struct Cli {
    /// Storage directory holding the model database.
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Absolute directory for rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List model names.
    Models,
    /// List unit names of a model.
    Units { model: String },
    /// Print a unit as JSON.
    Show {
        model: String,
        unit: String,
        /// Print only the interface projection.
        #[arg(long)]
        interface: bool,
    },
    /// Store a unit read from a JSON file.
    Put {
        model: String,
        unit: String,
        file: PathBuf,
    },
    /// Rename a unit inside its model.
    Rename {
        model: String,
        old_name: String,
        new_name: String,
    },
    /// Delete one unit.
    DeleteUnit { model: String, unit: String },
    /// Delete a model and all of its units.
    DeleteModel { model: String },
    /// Print the core version.
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }

    if let Command::Version = cli.command {
        println!("modelstore_core version={}", core_version());
        return Ok(());
    }

    let config = match &cli.store_dir {
        Some(dir) => StoreConfig::in_directory(dir),
        None => StoreConfig::from_env()
            .with_context(|| format!("pass --store-dir or set {STORE_DIR_ENV}"))?,
    };
    let store = StoreManager::new(config);
    let repo = UnitRepository::new(&store, JsonUnitSerializer, Arc::new(LogNotifier));

    run(&repo, cli.command)
}

fn run(repo: &UnitRepository<'_, JsonUnitSerializer>, command: Command) -> Result<()> {
    match command {
        Command::Models => {
            for model in repo.list_models()? {
                println!("{model}");
            }
        }
        Command::Units { model } => {
            for unit in repo.list_units(&model)? {
                println!("{unit}");
            }
        }
        Command::Show {
            model,
            unit,
            interface,
        } => {
            let outcome = if interface {
                repo.load_unit_interface(&model, &unit)?
            } else {
                repo.load_unit(&model, &unit)?
            };
            match outcome {
                LoadOutcome::Loaded(loaded) => {
                    println!("{}", serde_json::to_string_pretty(&loaded)?);
                }
                LoadOutcome::NotFound => bail!("unit {model}/{unit} does not exist"),
                LoadOutcome::Rejected(rejection) => bail!("{rejection}"),
            }
        }
        Command::Put { model, unit, file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read `{}`", file.display()))?;
            let document: ModelUnit = serde_json::from_str(&text)
                .with_context(|| format!("`{}` is not a model unit", file.display()))?;
            expect_saved(repo.save_unit(&model, &unit, &document)?)?;
            println!("saved {model}/{unit}");
        }
        Command::Rename {
            model,
            old_name,
            new_name,
        } => {
            let Some(mut document) = repo.load_unit(&model, &old_name)?.loaded() else {
                bail!("unit {model}/{old_name} cannot be loaded");
            };
            document.name = new_name.clone();
            expect_saved(repo.rename_unit(&model, &old_name, &new_name, &document)?)?;
            println!("renamed {model}/{old_name} to {model}/{new_name}");
        }
        Command::DeleteUnit { model, unit } => {
            if repo.delete_unit(&model, &unit)? {
                println!("deleted {model}/{unit}");
            } else {
                println!("no unit {model}/{unit}");
            }
        }
        Command::DeleteModel { model } => {
            let removed = repo.delete_model(&model)?;
            println!("deleted {removed} unit(s) of {model}");
        }
        Command::Version => {}
    }
    Ok(())
}

fn expect_saved(outcome: SaveOutcome) -> Result<()> {
    match outcome {
        SaveOutcome::Saved => Ok(()),
        SaveOutcome::Rejected(rejection) => bail!("{rejection}"),
    }
}
