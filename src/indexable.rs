// src/indexable.rs

//! Identity types shared by every node in a task graph.
//!
//! Anything a node produces implements [`Indexable`]: it has a stable key and
//! can be recovered as its concrete type by dependents through
//! [`crate::graph::DependencyResults::get_as`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Generate a fresh process-unique key.
pub fn new_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Upcast helper so `Arc<dyn Indexable>` can be downcast to a concrete type.
pub trait AsAnyArc: Any + Send + Sync {
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Something with a key.
pub trait Indexable: AsAnyArc + fmt::Debug {
    fn key(&self) -> &str;
}

/// Result produced by one node, shared read-only with every dependent.
pub type TaskOutput = Arc<dyn Indexable>;

/// Downcast a node output to its concrete type.
pub fn downcast_output<T: Indexable>(output: &TaskOutput) -> Option<Arc<T>> {
    Arc::clone(output).as_any_arc().downcast::<T>().ok()
}

/// A bare key with no payload.
///
/// Used as the output of work that has no meaningful value (a restart, a
/// delete) and as the placeholder root of a group that only aggregates
/// dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexableRef {
    key: String,
}

impl IndexableRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn generated() -> Self {
        Self::new(new_key())
    }
}

impl Indexable for IndexableRef {
    fn key(&self) -> &str {
        &self.key
    }
}

/// Keyed wrapper that exclusively owns an inner model.
///
/// The inner model can be replaced wholesale (after a refresh from the
/// service) but is never shared mutably.
#[derive(Debug, Clone)]
pub struct IndexableWrapper<I> {
    key: String,
    inner: I,
}

impl<I> IndexableWrapper<I> {
    pub fn new(inner: I) -> Self {
        Self::with_key(new_key(), inner)
    }

    pub fn with_key(key: impl Into<String>, inner: I) -> Self {
        Self {
            key: key.into(),
            inner,
        }
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }

    /// Replace the inner model, returning the previous one.
    pub fn set_inner(&mut self, inner: I) -> I {
        std::mem::replace(&mut self.inner, inner)
    }

    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<I> Indexable for IndexableWrapper<I>
where
    I: fmt::Debug + Send + Sync + 'static,
{
    fn key(&self) -> &str {
        &self.key
    }
}
