// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{GraphError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::GraphError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.engine, raw.poller, raw.task))
    }
}

// Cycles are reported by the engine when the graph is invoked.
fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_engine_config(cfg)?;
    validate_task_references(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(GraphError::Configuration(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_engine_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.engine.max_concurrency == Some(0) {
        return Err(GraphError::Configuration(
            "[engine].max_concurrency must be >= 1 (got 0)".to_string(),
        ));
    }

    if let Some(root) = &cfg.engine.root {
        if !cfg.task.contains_key(root) {
            return Err(GraphError::Configuration(format!(
                "[engine].root refers to unknown task '{root}'"
            )));
        }
    }

    Ok(())
}

fn validate_task_references(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(GraphError::Configuration(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }

        if let Some(target) = &task.post_run_of {
            if !cfg.task.contains_key(target) {
                return Err(GraphError::Configuration(format!(
                    "task '{}' has unknown `post_run_of` target '{}'",
                    name, target
                )));
            }
            if target == name {
                return Err(GraphError::Configuration(format!(
                    "task '{}' cannot be a post-run dependent of itself",
                    name
                )));
            }
        }
    }
    Ok(())
}
