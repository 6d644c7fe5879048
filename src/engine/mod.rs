// src/engine/mod.rs

//! Runner that turns a [`ConfigFile`] into task groups and invokes them.
//!
//! Every `[task.<name>]` becomes one [`TaskGroup`] keyed by its name whose
//! root is a [`SimulatedTask`]. `after` entries become dependency groups and
//! `post_run_of` registers the task as a post-run dependent of its target.

pub mod report;
pub mod simulated;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::errors::{GraphError, Result};
use crate::exec::InvocationContext;
use crate::graph::TaskGroup;
use crate::tasks::ExecuteTask;

pub use report::{ReportLine, RunReport};
pub use simulated::{SimulatedOutput, SimulatedResource, SimulatedTask};

/// Build one group per configured task and wire them together.
pub fn build_groups(cfg: &ConfigFile) -> BTreeMap<String, TaskGroup> {
    let groups: BTreeMap<String, TaskGroup> = cfg
        .task
        .iter()
        .map(|(name, task)| {
            let item = ExecuteTask::new(Arc::new(SimulatedTask::from_config(name, task)));
            (name.clone(), TaskGroup::new(name.clone(), Arc::new(item)))
        })
        .collect();

    for (name, task) in cfg.task.iter() {
        let Some(group) = groups.get(name) else {
            continue;
        };
        for dep in &task.after {
            if let Some(dep_group) = groups.get(dep) {
                group.add_dependency_group(dep_group);
            }
        }
        if let Some(target) = task.post_run_of.as_ref().and_then(|t| groups.get(t)) {
            debug!(task = %name, target = %target.key(), "registering post-run dependent");
            target.add_post_run_dependent_group(group);
        }
    }

    groups
}

/// Resolve the root task, honouring an explicit override.
pub fn resolve_root<'a>(cfg: &'a ConfigFile, override_root: Option<&'a str>) -> Result<&'a str> {
    match override_root {
        Some(root) if cfg.task.contains_key(root) => Ok(root),
        Some(root) => Err(GraphError::Configuration(format!(
            "unknown root task '{root}'"
        ))),
        None => cfg.root_task().ok_or_else(|| {
            GraphError::Configuration(
                "cannot infer a single root task; set [engine].root or pass --root".to_string(),
            )
        }),
    }
}

/// Invoke the graph rooted at `root` and summarise what happened.
pub async fn run_config(
    cfg: &ConfigFile,
    root: &str,
    ctx: &InvocationContext,
) -> Result<RunReport> {
    let groups = build_groups(cfg);
    let group = groups
        .get(root)
        .ok_or_else(|| GraphError::Configuration(format!("unknown root task '{root}'")))?;

    info!(root = %root, tasks = groups.len(), "running task graph");
    let outcome = group.invoke_detailed(ctx).await?;
    Ok(RunReport::from_outcome(&outcome))
}
