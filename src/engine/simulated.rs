// src/engine/simulated.rs

//! Simulated work used by the command-line runner.

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use tracing::{debug, info};

use crate::config::TaskConfig;
use crate::graph::DependencyResults;
use crate::indexable::IndexableWrapper;
use crate::tasks::{Executor, HookFuture, ResourceFuture};

/// What a simulated task produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedResource {
    pub name: String,
    /// Keys of the results visible when the task ran.
    pub inputs: Vec<String>,
    /// Set when the task ran as a post-run dependent of a faulted group.
    pub after_fault: bool,
}

pub type SimulatedOutput = IndexableWrapper<SimulatedResource>;

/// Sleeps for a configured time, then succeeds or fails.
#[derive(Debug, Clone)]
pub struct SimulatedTask {
    name: String,
    delay: Duration,
    fail: bool,
}

impl SimulatedTask {
    pub fn new(name: impl Into<String>, delay: Duration, fail: bool) -> Self {
        Self {
            name: name.into(),
            delay,
            fail,
        }
    }

    pub fn from_config(name: &str, cfg: &TaskConfig) -> Self {
        Self::new(name, Duration::from_millis(cfg.delay_ms), cfg.fail)
    }
}

impl Executor for SimulatedTask {
    type Output = SimulatedOutput;

    fn execute_work(self: Arc<Self>, deps: DependencyResults) -> ResourceFuture<Self::Output> {
        Box::pin(async move {
            info!(task = %self.name, delay_ms = self.delay.as_millis() as u64, "running simulated task");
            tokio::time::sleep(self.delay).await;

            if self.fail {
                bail!("simulated failure in task '{}'", self.name);
            }

            let mut inputs: Vec<String> = deps.keys().map(str::to_string).collect();
            inputs.sort();
            Ok(Arc::new(IndexableWrapper::with_key(
                self.name.clone(),
                SimulatedResource {
                    name: self.name.clone(),
                    inputs,
                    after_fault: deps.group_faulted(),
                },
            )))
        })
    }

    fn after_post_run(self: Arc<Self>, is_group_faulted: bool) -> HookFuture {
        Box::pin(async move {
            debug!(task = %self.name, is_group_faulted, "simulated task finished post-run phase");
            Ok(())
        })
    }
}
