// src/exec/context.rs

//! Per-invocation settings passed explicitly into the graph invoker.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::EngineConfig;
use crate::graph::GroupEvent;

use super::backend::{Dispatcher, InlineDispatcher, TokioDispatcher};

/// Where and how a graph invocation runs.
///
/// Cheap to clone; post-run groups are invoked with a clone of the caller's
/// context.
#[derive(Clone)]
pub struct InvocationContext {
    dispatcher: Arc<dyn Dispatcher>,
    max_concurrency: Option<usize>,
    events: Option<mpsc::UnboundedSender<GroupEvent>>,
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("dispatcher", &self.dispatcher)
            .field("max_concurrency", &self.max_concurrency)
            .field("events", &self.events.is_some())
            .finish()
    }
}

impl InvocationContext {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            dispatcher,
            max_concurrency: None,
            events: None,
        }
    }

    /// Spawn node work on the current Tokio runtime.
    pub fn tokio() -> Self {
        Self::new(Arc::new(TokioDispatcher::current()))
    }

    /// Run node work on the invoking task.
    pub fn inline() -> Self {
        Self::new(Arc::new(InlineDispatcher))
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let ctx = Self::tokio();
        match config.max_concurrency {
            Some(n) => ctx.with_max_concurrency(n),
            None => ctx,
        }
    }

    /// Bound the number of nodes in flight at once. Zero is treated as one.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit.max(1));
        self
    }

    /// Stream [`GroupEvent`]s to `tx` as the invocation progresses.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<GroupEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn dispatcher(&self) -> &dyn Dispatcher {
        self.dispatcher.as_ref()
    }

    pub fn max_concurrency(&self) -> Option<usize> {
        self.max_concurrency
    }

    pub(crate) fn emit(&self, event: GroupEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is listening.
            let _ = tx.send(event);
        }
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::tokio()
    }
}
