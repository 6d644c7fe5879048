// src/lib.rs

//! Dependency-ordered execution of task graphs.
//!
//! A [`TaskGroup`] holds a root task and everything it depends on. Invoking
//! the group runs each node once, after its dependencies, with bounded
//! concurrency, then runs any post-run dependents whether or not the main
//! graph faulted. Long-running operations started by a task are tracked by
//! a [`Poller`] or the caller-facing [`Accepted`] wrapper.

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod graph;
pub mod indexable;
pub mod logging;
pub mod lro;
pub mod tasks;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::model::ConfigFile;
use crate::exec::InvocationContext;

pub use crate::errors::GraphError;
pub use crate::graph::{DependencyResults, GroupOutcome, NodeOutcome, NodeStatus, TaskGroup};
pub use crate::indexable::{Indexable, IndexableRef, IndexableWrapper, TaskOutput};
pub use crate::lro::{Accepted, OperationStatus, Poller};
pub use crate::tasks::{CreateUpdateTask, ExecuteTask, TaskItem};

/// High-level entry point used by `main.rs`.
///
/// Returns `Ok(false)` when the graph ran but the root did not complete.
pub async fn run(args: CliArgs) -> Result<bool> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let root = engine::resolve_root(&cfg, args.root.as_deref())?.to_string();

    if args.dry_run {
        print_dry_run(&cfg, &root);
        return Ok(true);
    }

    let ctx = InvocationContext::from_config(&cfg.engine);
    info!(config = %config_path.display(), root = %root, "starting invocation");

    let run = engine::run_config(&cfg, &root, &ctx);
    let report = match cfg.poller.timeout() {
        Some(limit) => tokio::time::timeout(limit, run)
            .await
            .map_err(|_| anyhow::anyhow!("run did not finish within {}s", limit.as_secs()))??,
        None => run.await?,
    };
    print!("{report}");

    if !report.success {
        info!(root = %root, "root task did not complete");
    }
    Ok(report.success)
}

/// Simple dry-run output: print tasks and how they are wired.
fn print_dry_run(cfg: &ConfigFile, root: &str) {
    println!("taskgroup dry-run");
    println!("  root = {root}");
    match cfg.engine.max_concurrency {
        Some(n) => println!("  engine.max_concurrency = {n}"),
        None => println!("  engine.max_concurrency = unbounded"),
    }
    println!(
        "  poller.default_interval_secs = {}",
        cfg.poller.default_interval_secs
    );
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if task.delay_ms > 0 {
            println!("      delay_ms: {}", task.delay_ms);
        }
        if task.fail {
            println!("      fail: true");
        }
        if let Some(ref target) = task.post_run_of {
            println!("      post_run_of: {target}");
        }
    }

    debug!("dry-run complete (no execution)");
}
