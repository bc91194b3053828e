// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod resolve;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::{ConfigFile, WatchTarget};
use crate::engine::Engine;
use crate::errors::Result;
use crate::exec::{ConsoleSink, ShellBackend};
use crate::watch::path_utils::config_root_dir;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + CLI policy overrides
/// - variable resolution, task executor, process backend
/// - (optional) file watcher and change dispatcher
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;
    apply_overrides(&mut cfg, &args);

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let root = config_root_dir(&config_path);
    info!(config = ?config_path, root = ?root, task = %args.task, "starting");

    let backend = Arc::new(ShellBackend::new(root.clone()));
    let engine = Engine::new(&cfg, root, backend, Arc::new(ConsoleSink))?;

    engine.run(&args.task, !args.once).await
}

/// Run `initial_task` from the config at `config_path` and map the result to
/// a process exit code: `0` on success, `1` on any error (logged).
///
/// Returns only when the task is done if the config has no watch rules;
/// otherwise keeps watching until interrupted or a fatal error occurs.
pub async fn run_engine(config_path: impl AsRef<Path>, initial_task: &str) -> i32 {
    let config = config_path.as_ref().to_string_lossy().into_owned();
    match run(CliArgs::for_task(config, initial_task)).await {
        Ok(()) => 0,
        Err(err) => {
            error!(error = %err, "buildwatch failed");
            1
        }
    }
}

fn apply_overrides(cfg: &mut ConfigFile, args: &CliArgs) {
    let settings = cfg.settings_mut();
    if let Some(policy) = args.on_failure {
        settings.on_command_failure = policy;
    }
    if let Some(policy) = args.undefined_variables {
        settings.undefined_variable = policy;
    }
    if let Some(policy) = args.missing_watch_task {
        settings.missing_watch_task = policy;
    }
}

/// Simple dry-run output: print policies, variables, tasks and watch rules.
fn print_dry_run(cfg: &ConfigFile) {
    let settings = cfg.settings();
    println!("buildwatch dry-run");
    println!("  config.undefined_variable = {:?}", settings.undefined_variable);
    println!("  config.on_command_failure = {:?}", settings.on_command_failure);
    println!("  config.missing_watch_task = {:?}", settings.missing_watch_task);
    println!();

    println!("variables ({}):", cfg.variables().len());
    for (name, value) in cfg.variables().iter() {
        println!("  - {name} = {value}");
    }
    println!();

    println!("tasks ({}):", cfg.tasks().len());
    for (name, commands) in cfg.tasks().iter() {
        println!("  - {name}");
        for cmd in commands {
            println!("      {cmd}");
        }
    }
    println!();

    println!("watch ({}):", cfg.watch_rules().len());
    for (pattern, target) in cfg.watch_rules().iter() {
        match target {
            WatchTarget::Task(task) => {
                let marker = if task.daemon { "#" } else { "" };
                println!("  - {pattern} -> task {marker}{}", task.name);
            }
            WatchTarget::Commands(commands) => {
                println!("  - {pattern} -> commands {commands:?}");
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
