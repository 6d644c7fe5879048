// src/tasks/execute.rs

//! Adapter for actions with no create/update split (start, stop, restart).

use std::sync::Arc;

use crate::graph::DependencyResults;
use crate::indexable::{Indexable, TaskOutput};

use super::create_update::ResourceFuture;
use super::item::{HookFuture, TaskItem, WorkFuture};

pub trait Executor: Send + Sync + 'static {
    type Output: Indexable;

    fn before_group_execute(&self) {}

    fn execute_work(self: Arc<Self>, deps: DependencyResults) -> ResourceFuture<Self::Output>;

    fn after_post_run(self: Arc<Self>, is_group_faulted: bool) -> HookFuture {
        let _ = is_group_faulted;
        Box::pin(async { Ok(()) })
    }
}

/// [`TaskItem`] wrapping an [`Executor`].
pub struct ExecuteTask<E> {
    executor: Arc<E>,
}

impl<E: Executor> ExecuteTask<E> {
    pub fn new(executor: Arc<E>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }
}

impl<E: Executor> TaskItem for ExecuteTask<E> {
    fn before_group_invoke(&self) {
        self.executor.before_group_execute();
    }

    fn invoke(self: Arc<Self>, deps: DependencyResults) -> WorkFuture {
        let pending = Arc::clone(&self.executor).execute_work(deps);
        Box::pin(async move {
            let output: TaskOutput = pending.await?;
            Ok(output)
        })
    }

    fn after_post_run(self: Arc<Self>, is_group_faulted: bool) -> HookFuture {
        Arc::clone(&self.executor).after_post_run(is_group_faulted)
    }
}
