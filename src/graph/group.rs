// src/graph/group.rs

//! The task group: a root node plus everything it depends on.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::errors::{GraphError, Result};
use crate::exec::{InvocationContext, block_on};
use crate::indexable::{Indexable, TaskOutput, downcast_output, new_key};
use crate::tasks::{FunctionTask, TaskItem};

use super::invoker;
use super::node::{NodeState, NodeStatus, TaskNode};
use super::outcome::GroupOutcome;
use super::results::DependencyResults;

pub(crate) struct GroupState {
    pub(crate) root_key: String,
    pub(crate) nodes: HashMap<String, TaskNode>,
    /// Groups whose roots the root of this group depends on.
    pub(crate) dependency_groups: Vec<TaskGroup>,
    /// Groups run after this group's main graph, faulted or not.
    pub(crate) post_run_groups: Vec<TaskGroup>,
}

struct GroupShared {
    state: Mutex<GroupState>,
    invoking: AtomicBool,
}

/// A DAG of [`TaskItem`]s with one designated root.
///
/// `TaskGroup` is a shared handle: clones refer to the same graph, and a
/// group merged into several others (a network needed by two machines) is
/// still run once. Cycles are only detected when a group is invoked.
#[derive(Clone)]
pub struct TaskGroup {
    shared: Arc<GroupShared>,
}

impl fmt::Debug for TaskGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("TaskGroup")
            .field("root", &state.root_key)
            .field("nodes", &state.nodes.len())
            .field("dependency_groups", &state.dependency_groups.len())
            .field("post_run_groups", &state.post_run_groups.len())
            .finish()
    }
}

impl TaskGroup {
    /// Create a group whose root is `root`, keyed by `key`.
    pub fn new(key: impl Into<String>, root: Arc<dyn TaskItem>) -> Self {
        let key = key.into();
        let mut nodes = HashMap::new();
        nodes.insert(key.clone(), TaskNode::new(key.clone(), root));
        Self {
            shared: Arc::new(GroupShared {
                state: Mutex::new(GroupState {
                    root_key: key,
                    nodes,
                    dependency_groups: Vec::new(),
                    post_run_groups: Vec::new(),
                }),
                invoking: AtomicBool::new(false),
            }),
        }
    }

    /// Create a group with a generated key.
    pub fn from_item(root: Arc<dyn TaskItem>) -> Self {
        Self::new(new_key(), root)
    }

    /// Create a group whose root runs an async closure.
    pub fn from_fn<F, Fut>(key: impl Into<String>, work: F) -> Self
    where
        F: Fn(DependencyResults) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<TaskOutput>> + Send + 'static,
    {
        Self::new(key, Arc::new(FunctionTask::new(work)))
    }

    /// Key of the root node.
    pub fn key(&self) -> String {
        self.lock().root_key.clone()
    }

    pub fn ptr_eq(&self, other: &TaskGroup) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Register `item` as a new leaf the root depends on. Returns its key.
    pub fn add_dependency(&self, item: Arc<dyn TaskItem>) -> String {
        let key = new_key();
        let mut state = self.lock();
        let root_key = state.root_key.clone();
        state
            .nodes
            .insert(key.clone(), TaskNode::new(key.clone(), item));
        if let Some(root) = state.nodes.get_mut(&root_key) {
            root.add_dependency(&key);
        }
        debug!(root = %root_key, dependency = %key, "added dependency node");
        key
    }

    /// Register an async closure as a new leaf the root depends on.
    pub fn add_dependency_fn<F, Fut>(&self, work: F) -> String
    where
        F: Fn(DependencyResults) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<TaskOutput>> + Send + 'static,
    {
        self.add_dependency(Arc::new(FunctionTask::new(work)))
    }

    /// Make `other`'s root a prerequisite of this group's root.
    ///
    /// Adding the same group twice has no further effect.
    pub fn add_dependency_group(&self, other: &TaskGroup) {
        let mut state = self.lock();
        if state.dependency_groups.iter().any(|g| g.ptr_eq(other)) {
            return;
        }
        debug!(root = %state.root_key, "added dependency group");
        state.dependency_groups.push(other.clone());
    }

    /// Run `item` after this group's main graph, whether or not it faulted.
    /// Returns the new node's key.
    pub fn add_post_run_dependent(&self, item: Arc<dyn TaskItem>) -> String {
        let group = TaskGroup::from_item(item);
        let key = group.key();
        self.add_post_run_dependent_group(&group);
        key
    }

    pub fn add_post_run_dependent_fn<F, Fut>(&self, work: F) -> String
    where
        F: Fn(DependencyResults) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<TaskOutput>> + Send + 'static,
    {
        self.add_post_run_dependent(Arc::new(FunctionTask::new(work)))
    }

    /// Run `other` (with its own dependencies) after this group's main graph.
    pub fn add_post_run_dependent_group(&self, other: &TaskGroup) {
        let mut state = self.lock();
        if state.post_run_groups.iter().any(|g| g.ptr_eq(other)) {
            return;
        }
        debug!(root = %state.root_key, "added post-run dependent group");
        state.post_run_groups.push(other.clone());
    }

    /// Result of a completed node reachable from this group.
    ///
    /// Returns `None`, not an error, for nodes that have not completed.
    pub fn task_result(&self, key: &str) -> Option<TaskOutput> {
        self.find_node(key, |node| match &node.state {
            NodeState::Completed(output) => Some(Arc::clone(output)),
            _ => None,
        })
        .flatten()
    }

    /// Typed form of [`TaskGroup::task_result`].
    pub fn task_result_as<T: Indexable>(&self, key: &str) -> Option<Arc<T>> {
        self.task_result(key)
            .and_then(|output| downcast_output::<T>(&output))
    }

    /// Lifecycle of a node reachable from this group.
    pub fn node_status(&self, key: &str) -> Option<NodeStatus> {
        self.find_node(key, |node| NodeStatus::from(&node.state))
    }

    /// Keys of every node reachable through dependencies (post-run groups
    /// excluded), sorted.
    pub fn node_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        self.walk(|group| {
            keys.extend(group.lock().nodes.keys().cloned());
        });
        keys.sort();
        keys.dedup();
        keys
    }

    /// Execute the graph and return the root's result.
    pub async fn invoke(&self, ctx: &InvocationContext) -> Result<TaskOutput> {
        self.invoke_detailed(ctx).await?.root
    }

    /// Execute the graph and return what happened to every node.
    ///
    /// The outer error is reserved for problems found before any work runs
    /// (cycles, duplicate keys, concurrent invocation).
    pub async fn invoke_detailed(&self, ctx: &InvocationContext) -> Result<GroupOutcome> {
        invoker::invoke_group(self, ctx, None).await
    }

    /// Execute the graph and downcast the root's result.
    pub async fn invoke_typed<T: Indexable>(&self, ctx: &InvocationContext) -> Result<Arc<T>> {
        let output = self.invoke(ctx).await?;
        let key = output.key().to_string();
        downcast_output::<T>(&output).ok_or_else(|| {
            GraphError::Configuration(format!(
                "result of '{key}' is not a {}",
                std::any::type_name::<T>()
            ))
        })
    }

    /// Blocking form of [`TaskGroup::invoke`] for callers outside a runtime.
    pub fn invoke_blocking(&self, ctx: &InvocationContext) -> Result<TaskOutput> {
        block_on(self.invoke(ctx))?
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, GroupState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark this group as being invoked. Returns `false` if it already was.
    pub(crate) fn try_begin_invoke(&self) -> bool {
        self.shared
            .invoking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn end_invoke(&self) {
        self.shared.invoking.store(false, Ordering::Release);
    }

    pub(crate) fn set_node_state(&self, key: &str, state: NodeState) {
        if let Some(node) = self.lock().nodes.get_mut(key) {
            node.state = state;
        }
    }

    /// Visit this group and every group reachable through dependency edges,
    /// each once.
    pub(crate) fn walk(&self, mut visit: impl FnMut(&TaskGroup)) {
        let mut seen: HashSet<*const GroupShared> = HashSet::new();
        let mut stack = vec![self.clone()];
        while let Some(group) = stack.pop() {
            if !seen.insert(Arc::as_ptr(&group.shared)) {
                continue;
            }
            visit(&group);
            let deps = group.lock().dependency_groups.clone();
            stack.extend(deps);
        }
    }

    fn find_node<T>(&self, key: &str, read: impl Fn(&TaskNode) -> T) -> Option<T> {
        let mut visited = HashSet::new();
        self.find_node_in(key, &read, &mut visited)
    }

    /// Search the dependency tree first, then post-run groups.
    fn find_node_in<T>(
        &self,
        key: &str,
        read: &impl Fn(&TaskNode) -> T,
        visited: &mut HashSet<*const GroupShared>,
    ) -> Option<T> {
        let mut groups = Vec::new();
        self.walk(|group| groups.push(group.clone()));

        for group in &groups {
            if !visited.insert(Arc::as_ptr(&group.shared)) {
                continue;
            }
            let (found, post_runs) = {
                let state = group.lock();
                (state.nodes.get(key).map(read), state.post_run_groups.clone())
            };
            if found.is_some() {
                return found;
            }
            for post_run in post_runs {
                if let Some(found) = post_run.find_node_in(key, read, visited) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Snapshot of node states for diagnostics, keyed by node key.
    pub fn statuses(&self) -> BTreeMap<String, NodeStatus> {
        let mut out = BTreeMap::new();
        self.walk(|group| {
            for (key, node) in group.lock().nodes.iter() {
                out.insert(key.clone(), NodeStatus::from(&node.state));
            }
        });
        out
    }
}
