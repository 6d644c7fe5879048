// src/graph/results.rs

//! Read-only view of results handed to a node's work.

use std::collections::HashMap;
use std::sync::Arc;

use crate::indexable::{Indexable, TaskOutput, downcast_output};

/// Results that were complete when a node was scheduled.
///
/// Always contains every dependency of the node. Values are shared with the
/// nodes that produced them and are never mutated.
#[derive(Debug, Clone, Default)]
pub struct DependencyResults {
    results: Arc<HashMap<String, TaskOutput>>,
    group_faulted: Option<bool>,
}

impl DependencyResults {
    pub(crate) fn new(results: Arc<HashMap<String, TaskOutput>>, group_faulted: Option<bool>) -> Self {
        Self {
            results,
            group_faulted,
        }
    }

    pub fn get(&self, key: &str) -> Option<&TaskOutput> {
        self.results.get(key)
    }

    /// Result for `key` as its concrete type.
    pub fn get_as<T: Indexable>(&self, key: &str) -> Option<Arc<T>> {
        self.results.get(key).and_then(downcast_output::<T>)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.results.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// `true` when this node runs as a post-run dependent.
    pub fn is_post_run(&self) -> bool {
        self.group_faulted.is_some()
    }

    /// Whether the group this node runs after faulted. Always `false` for
    /// ordinary nodes.
    pub fn group_faulted(&self) -> bool {
        self.group_faulted.unwrap_or(false)
    }
}
