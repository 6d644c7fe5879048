// src/graph/events.rs

//! Progress events emitted while a group is invoked.

/// One step of a group invocation, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupEvent {
    /// Work for a node was handed to the dispatcher.
    NodeStarted { key: String },
    /// A node has a result. `reused` means it came from an earlier invocation.
    NodeCompleted { key: String, reused: bool },
    /// A node's work failed.
    NodeFaulted { key: String, error: String },
    /// A node was not run because `dependency` faulted.
    NodeSkipped { key: String, dependency: String },
    /// A post-run dependent group is about to run.
    PostRunStarted { key: String, group_faulted: bool },
    /// The invoked group (identified by its root key) is done.
    GroupFinished { key: String, faulted: bool },
}

impl GroupEvent {
    pub fn key(&self) -> &str {
        match self {
            GroupEvent::NodeStarted { key }
            | GroupEvent::NodeCompleted { key, .. }
            | GroupEvent::NodeFaulted { key, .. }
            | GroupEvent::NodeSkipped { key, .. }
            | GroupEvent::PostRunStarted { key, .. }
            | GroupEvent::GroupFinished { key, .. } => key,
        }
    }
}
