// src/graph/capability.rs

//! Capabilities for domain objects that carry a task group.
//!
//! A fluent "definition" (a network, a machine, a restart action) owns one
//! [`TaskGroup`] and exposes it through [`HasTaskGroup`]. Declaring that one
//! object needs another is then just merging their groups.

use std::future::Future;
use std::sync::Arc;

use crate::errors::Result;
use crate::exec::InvocationContext;
use crate::indexable::Indexable;

use super::group::TaskGroup;

pub trait HasTaskGroup {
    fn task_group(&self) -> &TaskGroup;

    /// `other` must complete before this object's root runs.
    fn depends_on(&self, other: &dyn HasTaskGroup) {
        self.task_group().add_dependency_group(other.task_group());
    }

    /// Run `other` after this object's graph, whether or not it faulted.
    fn add_post_run(&self, other: &dyn HasTaskGroup) {
        self.task_group()
            .add_post_run_dependent_group(other.task_group());
    }
}

impl HasTaskGroup for TaskGroup {
    fn task_group(&self) -> &TaskGroup {
        self
    }
}

/// An object whose task group's root yields a `Self::Output`.
pub trait ProducesResult: HasTaskGroup {
    type Output: Indexable;

    /// Invoke the whole graph and return the root's typed result.
    fn execute(
        &self,
        ctx: &InvocationContext,
    ) -> impl Future<Output = Result<Arc<Self::Output>>> + Send
    where
        Self: Sync,
    {
        async move { self.task_group().invoke_typed::<Self::Output>(ctx).await }
    }
}
