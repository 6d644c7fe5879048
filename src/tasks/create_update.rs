// src/tasks/create_update.rs

//! Create-or-update adapter.
//!
//! Whether a node creates or updates its resource is fixed when the node is
//! built, through [`Operation`], not looked up while the graph runs.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::bail;
use tracing::debug;

use crate::graph::DependencyResults;
use crate::indexable::{Indexable, TaskOutput};

use super::item::{HookFuture, TaskItem, WorkFuture};

pub type ResourceFuture<R> = Pin<Box<dyn Future<Output = anyhow::Result<Arc<R>>> + Send + 'static>>;

/// What a [`CreateUpdateTask`] does when invoked.
#[derive(Debug, Clone)]
pub enum Operation<D, R> {
    Create(D),
    Update { changes: D, current: Arc<R> },
}

impl<D, R> Operation<D, R> {
    pub fn is_create(&self) -> bool {
        matches!(self, Operation::Create(_))
    }
}

/// Something that can create and/or update one kind of resource.
///
/// Types that only support one direction leave the other at its default,
/// which fails with a configuration error.
pub trait ResourceCreatorUpdater: Send + Sync + 'static {
    /// Desired state supplied by the caller.
    type Definition: Clone + Send + Sync + 'static;
    /// Resource produced by the service.
    type Resource: Indexable;

    fn before_group_create_or_update(&self) {}

    fn create_resource(
        self: Arc<Self>,
        definition: Self::Definition,
        deps: DependencyResults,
    ) -> ResourceFuture<Self::Resource> {
        let _ = (definition, deps);
        Box::pin(async { bail!("configuration error: resource does not support create") })
    }

    fn update_resource(
        self: Arc<Self>,
        changes: Self::Definition,
        current: Arc<Self::Resource>,
        deps: DependencyResults,
    ) -> ResourceFuture<Self::Resource> {
        let _ = (changes, current, deps);
        Box::pin(async { bail!("configuration error: resource does not support update") })
    }

    fn after_post_run(self: Arc<Self>, is_group_faulted: bool) -> HookFuture {
        let _ = is_group_faulted;
        Box::pin(async { Ok(()) })
    }
}

/// [`TaskItem`] running one create or update.
pub struct CreateUpdateTask<C: ResourceCreatorUpdater> {
    creator: Arc<C>,
    operation: Operation<C::Definition, C::Resource>,
}

impl<C: ResourceCreatorUpdater> CreateUpdateTask<C> {
    pub fn new(creator: Arc<C>, operation: Operation<C::Definition, C::Resource>) -> Self {
        Self { creator, operation }
    }

    pub fn create(creator: Arc<C>, definition: C::Definition) -> Self {
        Self::new(creator, Operation::Create(definition))
    }

    pub fn update(creator: Arc<C>, changes: C::Definition, current: Arc<C::Resource>) -> Self {
        Self::new(creator, Operation::Update { changes, current })
    }

    pub fn operation(&self) -> &Operation<C::Definition, C::Resource> {
        &self.operation
    }

    pub fn is_in_create_mode(&self) -> bool {
        self.operation.is_create()
    }
}

impl<C: ResourceCreatorUpdater> TaskItem for CreateUpdateTask<C> {
    fn before_group_invoke(&self) {
        self.creator.before_group_create_or_update();
    }

    fn invoke(self: Arc<Self>, deps: DependencyResults) -> WorkFuture {
        let creator = Arc::clone(&self.creator);
        let pending = match &self.operation {
            Operation::Create(definition) => {
                debug!("creating resource");
                creator.create_resource(definition.clone(), deps)
            }
            Operation::Update { changes, current } => {
                debug!(key = current.key(), "updating resource");
                creator.update_resource(changes.clone(), Arc::clone(current), deps)
            }
        };
        Box::pin(async move {
            let resource = pending.await?;
            let output: TaskOutput = resource;
            Ok(output)
        })
    }

    fn after_post_run(self: Arc<Self>, is_group_faulted: bool) -> HookFuture {
        Arc::clone(&self.creator).after_post_run(is_group_faulted)
    }
}
