// src/tasks/item.rs

//! The unit of work a task graph schedules.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::graph::DependencyResults;
use crate::indexable::TaskOutput;

/// Future producing one node's result.
pub type WorkFuture = Pin<Box<dyn Future<Output = anyhow::Result<TaskOutput>> + Send + 'static>>;

/// Future returned by lifecycle hooks.
pub type HookFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// One unit of asynchronous work in a [`crate::graph::TaskGroup`].
///
/// The group calls the methods in this order during an invocation:
///
/// 1. [`TaskItem::before_group_invoke`] on every node that will run, before
///    any work starts;
/// 2. [`TaskItem::invoke`] once dependencies have completed;
/// 3. [`TaskItem::after_post_run`] after the group's post-run dependents
///    have finished, whether or not the group faulted.
pub trait TaskItem: Send + Sync {
    /// Group-wide pre-hook.
    fn before_group_invoke(&self) {}

    /// Whether the side effect has already been triggered.
    ///
    /// A faulted hot item keeps its fault on later invocations; a faulted
    /// cold item is retried.
    fn is_hot(&self) -> bool {
        false
    }

    /// Start the work. `deps` exposes every result completed before this
    /// node was scheduled, including all of its dependencies.
    fn invoke(self: Arc<Self>, deps: DependencyResults) -> WorkFuture;

    /// Cleanup hook run after post-run dependents.
    fn after_post_run(self: Arc<Self>, is_group_faulted: bool) -> HookFuture {
        let _ = is_group_faulted;
        Box::pin(async { Ok(()) })
    }
}
