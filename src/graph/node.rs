// src/graph/node.rs

//! Node bookkeeping stored in the owning group.

use std::fmt;
use std::sync::Arc;

use crate::errors::SharedError;
use crate::indexable::TaskOutput;
use crate::tasks::TaskItem;

/// Persistent state of a node (internal).
///
/// Results survive across invocations: a completed node is never run again,
/// and a faulted one is only retried when its item is cold.
#[derive(Clone)]
pub(crate) enum NodeState {
    Pending,
    Running,
    Completed(TaskOutput),
    Faulted(SharedError),
}

/// Public, read-only view of a node's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Pending,
    Running,
    Completed,
    Faulted,
}

impl From<&NodeState> for NodeStatus {
    fn from(state: &NodeState) -> Self {
        match state {
            NodeState::Pending => NodeStatus::Pending,
            NodeState::Running => NodeStatus::Running,
            NodeState::Completed(_) => NodeStatus::Completed,
            NodeState::Faulted(_) => NodeStatus::Faulted,
        }
    }
}

pub(crate) struct TaskNode {
    pub(crate) key: String,
    pub(crate) item: Arc<dyn TaskItem>,
    /// Keys of nodes in the same group that must complete first.
    pub(crate) dependencies: Vec<String>,
    pub(crate) state: NodeState,
}

impl TaskNode {
    pub(crate) fn new(key: String, item: Arc<dyn TaskItem>) -> Self {
        Self {
            key,
            item,
            dependencies: Vec::new(),
            state: NodeState::Pending,
        }
    }

    pub(crate) fn add_dependency(&mut self, key: &str) {
        if !self.dependencies.iter().any(|d| d == key) {
            self.dependencies.push(key.to_string());
        }
    }
}

impl fmt::Debug for TaskNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskNode")
            .field("key", &self.key)
            .field("dependencies", &self.dependencies)
            .field("status", &NodeStatus::from(&self.state))
            .finish()
    }
}

/// What happened to a node in one invocation.
#[derive(Debug, Clone)]
pub enum NodeOutcome {
    Completed { output: TaskOutput, reused: bool },
    Faulted(SharedError),
    Skipped { dependency: String },
}

impl NodeOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, NodeOutcome::Completed { .. })
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self, NodeOutcome::Faulted(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, NodeOutcome::Skipped { .. })
    }

    pub fn output(&self) -> Option<&TaskOutput> {
        match self {
            NodeOutcome::Completed { output, .. } => Some(output),
            _ => None,
        }
    }
}
