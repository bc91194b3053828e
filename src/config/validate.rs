// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, WatchTarget};
use crate::errors::{BuildwatchError, Result};
use crate::resolve::reference::{Command, DAEMON_MARKER};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BuildwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_task_names(cfg)?;
    validate_watch_rules(cfg)?;
    validate_task_references(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(BuildwatchError::ConfigError(
            "config must define at least one task in `task`".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_names(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.task.keys() {
        if name.trim().is_empty() {
            return Err(BuildwatchError::ConfigError(
                "task names must not be empty".to_string(),
            ));
        }
        if name.starts_with(DAEMON_MARKER) {
            return Err(BuildwatchError::ConfigError(format!(
                "task '{name}' must not start with '{DAEMON_MARKER}' (reserved for daemon mode)"
            )));
        }
    }
    Ok(())
}

fn validate_watch_rules(cfg: &RawConfigFile) -> Result<()> {
    for (pattern, target) in cfg.watch.iter() {
        if pattern.trim().is_empty() {
            return Err(BuildwatchError::ConfigError(
                "watch patterns must not be empty".to_string(),
            ));
        }
        match target {
            WatchTarget::Task(task) if task.name.is_empty() => {
                return Err(BuildwatchError::ConfigError(format!(
                    "watch pattern '{pattern}' is bound to an empty task name"
                )));
            }
            WatchTarget::Commands(cmds) if cmds.is_empty() => {
                return Err(BuildwatchError::ConfigError(format!(
                    "watch pattern '{pattern}' is bound to an empty command list"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Reject tasks that invoke themselves, directly or through other tasks.
///
/// Only references to defined tasks become edges: an unknown task is a
/// runtime `TaskNotFound`, not a config error.
fn validate_task_references(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: caller -> callee.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, commands) in cfg.task.iter() {
        for raw in commands {
            let Some(reference) = Command::parse(raw).task_reference() else {
                continue;
            };
            if let Some((callee, _)) = cfg.task.get_key_value(reference.name()) {
                graph.add_edge(name.as_str(), callee.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(BuildwatchError::TaskCycle(format!(
            "cycle detected in task references involving task '{}'",
            cycle.node_id()
        ))),
    }
}
