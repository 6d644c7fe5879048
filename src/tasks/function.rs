// src/tasks/function.rs

//! Closure-backed task items.

use std::future::Future;
use std::sync::Arc;

use crate::graph::DependencyResults;
use crate::indexable::TaskOutput;

use super::item::{TaskItem, WorkFuture};

/// A [`TaskItem`] built from an async closure.
pub struct FunctionTask<F> {
    work: F,
}

impl<F, Fut> FunctionTask<F>
where
    F: Fn(DependencyResults) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<TaskOutput>> + Send + 'static,
{
    pub fn new(work: F) -> Self {
        Self { work }
    }
}

impl<F, Fut> TaskItem for FunctionTask<F>
where
    F: Fn(DependencyResults) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<TaskOutput>> + Send + 'static,
{
    fn invoke(self: Arc<Self>, deps: DependencyResults) -> WorkFuture {
        Box::pin((self.work)(deps))
    }
}
