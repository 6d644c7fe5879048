// src/exec/backend.rs

//! Pluggable dispatch of node work.
//!
//! The graph invoker never awaits a node's work directly; it hands the work
//! to a [`Dispatcher`] and awaits whatever comes back. This decouples the
//! thread that declared the work from the one that runs it, and lets tests
//! swap in an inline dispatcher.
//!
//! - [`TokioDispatcher`] spawns each unit of work as its own Tokio task.
//! - [`InlineDispatcher`] polls the work on the invoker's own task. Siblings
//!   still interleave at their await points but never run on another thread.

use std::fmt;

use anyhow::anyhow;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::tasks::WorkFuture;

/// Trait abstracting where node work runs.
pub trait Dispatcher: Send + Sync + fmt::Debug {
    /// Take ownership of `work` and return a future resolving to its result.
    fn dispatch(&self, key: &str, work: WorkFuture) -> WorkFuture;
}

/// Dispatcher used in production: one Tokio task per node.
#[derive(Debug, Clone, Default)]
pub struct TokioDispatcher {
    handle: Option<Handle>,
}

impl TokioDispatcher {
    /// Spawn onto whichever runtime the invoker is running in.
    pub fn current() -> Self {
        Self { handle: None }
    }

    /// Spawn onto a specific runtime.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }
}

impl Dispatcher for TokioDispatcher {
    fn dispatch(&self, key: &str, work: WorkFuture) -> WorkFuture {
        let join = match &self.handle {
            Some(handle) => handle.spawn(work),
            None => tokio::spawn(work),
        };
        let key = key.to_string();
        debug!(key = %key, "spawned node work");

        Box::pin(async move {
            match join.await {
                Ok(result) => result,
                Err(err) if err.is_panic() => {
                    warn!(key = %key, "node work panicked");
                    Err(anyhow!("work for task '{key}' panicked"))
                }
                Err(err) => Err(anyhow!("work for task '{key}' was cancelled: {err}")),
            }
        })
    }
}

/// Dispatcher that runs work on the invoker's task.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, _key: &str, work: WorkFuture) -> WorkFuture {
        work
    }
}
