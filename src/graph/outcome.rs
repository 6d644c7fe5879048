// src/graph/outcome.rs

//! Result of one group invocation.

use std::collections::BTreeMap;

use crate::errors::{Result, SharedError};
use crate::indexable::TaskOutput;

use super::node::NodeOutcome;

#[derive(Debug)]
pub struct GroupOutcome {
    pub root_key: String,
    /// The root's result, or why it has none.
    pub root: Result<TaskOutput>,
    /// What happened to every node of the main graph.
    pub nodes: BTreeMap<String, NodeOutcome>,
    /// Keys in the order their work was handed to the dispatcher.
    pub dispatch_order: Vec<String>,
    /// Whether any node of the main graph faulted or was skipped.
    pub faulted: bool,
    /// One entry per post-run dependent group, in registration order.
    pub post_run: Vec<Result<GroupOutcome>>,
    /// `after_post_run` hooks that failed.
    pub hook_failures: Vec<(String, SharedError)>,
}

impl GroupOutcome {
    pub fn node(&self, key: &str) -> Option<&NodeOutcome> {
        self.nodes.get(key)
    }

    pub fn is_success(&self) -> bool {
        self.root.is_ok()
    }

    /// Whether any post-run dependent failed to run or faulted itself.
    pub fn post_run_faulted(&self) -> bool {
        self.post_run.iter().any(|p| match p {
            Ok(outcome) => outcome.faulted || outcome.post_run_faulted(),
            Err(_) => true,
        })
    }
}
