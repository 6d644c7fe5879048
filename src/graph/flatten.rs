// src/graph/flatten.rs

//! Merge a group and its dependency groups into one graph and order it.

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::{GraphError, Result};
use crate::tasks::TaskItem;

use super::group::TaskGroup;
use super::node::NodeState;

pub(crate) struct FlatNode {
    pub(crate) item: Arc<dyn TaskItem>,
    pub(crate) deps: Vec<String>,
    pub(crate) owner: TaskGroup,
    /// State persisted from earlier invocations.
    pub(crate) state: NodeState,
}

pub(crate) struct FlatGraph {
    pub(crate) root_key: String,
    pub(crate) nodes: HashMap<String, FlatNode>,
    /// Dependencies before dependents.
    pub(crate) order: Vec<String>,
    /// Every group taking part in the main graph.
    pub(crate) groups: Vec<TaskGroup>,
    /// Post-run dependents declared by any of `groups`, minus those that are
    /// already part of the main graph.
    pub(crate) post_run_groups: Vec<TaskGroup>,
}

/// Build the merged graph rooted at `root`.
///
/// Fails with [`GraphError::CyclicGraph`] if the merged graph has a cycle
/// and with [`GraphError::Configuration`] if two different groups use the
/// same node key.
pub(crate) fn flatten(root: &TaskGroup) -> Result<FlatGraph> {
    let mut groups = Vec::new();
    root.walk(|group| groups.push(group.clone()));

    let mut nodes: HashMap<String, FlatNode> = HashMap::new();
    let mut post_run_groups: Vec<TaskGroup> = Vec::new();

    for group in &groups {
        let (root_key, group_nodes, dependency_groups, post_runs) = {
            let state = group.lock();
            let group_nodes: Vec<_> = state
                .nodes
                .values()
                .map(|n| {
                    (
                        n.key.clone(),
                        Arc::clone(&n.item),
                        n.dependencies.clone(),
                        n.state.clone(),
                    )
                })
                .collect();
            (
                state.root_key.clone(),
                group_nodes,
                state.dependency_groups.clone(),
                state.post_run_groups.clone(),
            )
        };

        // Keys are read after the lock above is released; a group may list
        // itself as a dependency.
        let dependency_roots: Vec<String> = dependency_groups.iter().map(|g| g.key()).collect();

        for (key, item, mut deps, state) in group_nodes {
            if let Some(existing) = nodes.get(&key) {
                if !existing.owner.ptr_eq(group) {
                    return Err(GraphError::Configuration(format!(
                        "task key '{key}' is used by two different groups"
                    )));
                }
                continue;
            }
            if key == root_key {
                for dep in &dependency_roots {
                    if !deps.contains(dep) {
                        deps.push(dep.clone());
                    }
                }
            }
            nodes.insert(
                key,
                FlatNode {
                    item,
                    deps,
                    owner: group.clone(),
                    state,
                },
            );
        }

        for post_run in post_runs {
            if !post_run_groups.iter().any(|g| g.ptr_eq(&post_run)) {
                post_run_groups.push(post_run);
            }
        }
    }

    post_run_groups.retain(|p| !groups.iter().any(|g| g.ptr_eq(p)));

    let order = topological_order(&nodes)?;
    debug!(
        root = %root.key(),
        nodes = nodes.len(),
        groups = groups.len(),
        post_run_groups = post_run_groups.len(),
        "flattened task graph"
    );

    Ok(FlatGraph {
        root_key: root.key(),
        nodes,
        order,
        groups,
        post_run_groups,
    })
}

fn topological_order(nodes: &HashMap<String, FlatNode>) -> Result<Vec<String>> {
    // Edge direction: dependency -> dependent.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    let mut keys: Vec<&str> = nodes.keys().map(|k| k.as_str()).collect();
    keys.sort_unstable();
    for key in &keys {
        graph.add_node(*key);
    }

    for key in &keys {
        if let Some(node) = nodes.get(*key) {
            for dep in &node.deps {
                graph.add_edge(dep.as_str(), *key, ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(GraphError::CyclicGraph(cycle.node_id().to_string())),
    }
}
