// src/graph/invoker.rs

//! Per-invocation state machine.
//!
//! One invocation goes through these phases:
//!
//! 1. flatten the group with its dependency groups and order it (cycles and
//!    key clashes are rejected here, before any hook or work runs);
//! 2. seed per-run state from persisted node state, resetting cold faults;
//! 3. call `before_group_invoke` on every node that will run;
//! 4. repeatedly dispatch ready nodes and record completions, skipping
//!    dependents of faulted nodes;
//! 5. run post-run dependent groups with the group's faulted flag;
//! 6. call `after_post_run` on every node of the main graph not already
//!    covered by the graph a post-run group follows.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{debug, info, warn};

use crate::errors::{GraphError, Result, SharedError, share};
use crate::exec::InvocationContext;
use crate::indexable::TaskOutput;

use super::events::GroupEvent;
use super::flatten::{FlatGraph, flatten};
use super::group::TaskGroup;
use super::node::{NodeOutcome, NodeState};
use super::outcome::GroupOutcome;
use super::results::DependencyResults;

type InFlight = FuturesUnordered<
    Pin<Box<dyn Future<Output = (String, anyhow::Result<TaskOutput>)> + Send>>,
>;

/// What a post-run group inherits from the graph it runs after.
#[derive(Clone)]
pub(crate) struct Upstream {
    faulted: bool,
    results: HashMap<String, TaskOutput>,
    /// Nodes already attempted in this invocation; never retried.
    attempted: HashSet<String>,
    /// Groups already run in this invocation, as main graph or post-run.
    seen: Vec<TaskGroup>,
}

/// Per-run state of a node (internal).
#[derive(Clone)]
enum RunState {
    Pending,
    Running,
    Completed { output: TaskOutput, reused: bool },
    Faulted(SharedError),
    Skipped { dependency: String },
}

pub(crate) fn invoke_group<'a>(
    group: &'a TaskGroup,
    ctx: &'a InvocationContext,
    upstream: Option<Upstream>,
) -> Pin<Box<dyn Future<Output = Result<GroupOutcome>> + Send + 'a>> {
    Box::pin(async move {
        let graph = flatten(group)?;
        let guard = InvokeGuard::acquire(&graph.groups)?;

        info!(
            root = %graph.root_key,
            nodes = graph.nodes.len(),
            post_run = upstream.is_some(),
            "invoking task group"
        );

        let mut run = Run::new(&graph, upstream.as_ref());
        run.prepare(ctx, upstream.as_ref());
        run.drive(ctx).await;
        drop(guard);

        let faulted = run.faulted();
        if faulted {
            warn!(root = %graph.root_key, "task group faulted");
        }

        let post_run = run_post_run_groups(&graph, ctx, &run, upstream.as_ref()).await;
        let hook_failures = run_after_post_run_hooks(&graph, faulted, upstream.as_ref()).await;

        ctx.emit(GroupEvent::GroupFinished {
            key: graph.root_key.clone(),
            faulted,
        });
        info!(root = %graph.root_key, faulted, "task group finished");

        Ok(run.into_outcome(post_run, hook_failures))
    })
}

async fn run_post_run_groups(
    graph: &FlatGraph,
    ctx: &InvocationContext,
    run: &Run<'_>,
    upstream: Option<&Upstream>,
) -> Vec<Result<GroupOutcome>> {
    let mut outcomes = Vec::new();
    if graph.post_run_groups.is_empty() {
        return outcomes;
    }

    let faulted = run.faulted();
    let mut inherited = Upstream {
        faulted,
        results: run.completed.clone(),
        attempted: run.attempted(),
        seen: graph.groups.clone(),
    };
    if let Some(up) = upstream {
        inherited.attempted.extend(up.attempted.iter().cloned());
        inherited.seen.extend(up.seen.iter().cloned());
    }

    for post_run in &graph.post_run_groups {
        let key = post_run.key();
        if inherited.seen.iter().any(|g| g.ptr_eq(post_run)) {
            debug!(post_run = %key, "post-run dependent already ran in this invocation");
            continue;
        }
        inherited.seen.push(post_run.clone());
        info!(root = %graph.root_key, post_run = %key, group_faulted = faulted, "running post-run dependent");
        ctx.emit(GroupEvent::PostRunStarted {
            key: key.clone(),
            group_faulted: faulted,
        });

        let outcome = invoke_group(post_run, ctx, Some(inherited.clone())).await;
        match &outcome {
            Ok(o) if o.faulted => warn!(post_run = %key, "post-run dependent faulted"),
            Ok(_) => debug!(post_run = %key, "post-run dependent finished"),
            Err(err) => warn!(post_run = %key, error = %err, "post-run dependent could not run"),
        }
        if let Ok(o) = &outcome {
            inherited.attempted.extend(o.nodes.keys().cloned());
            for (k, n) in &o.nodes {
                if let Some(output) = n.output() {
                    inherited.results.insert(k.clone(), Arc::clone(output));
                }
            }
        }
        outcomes.push(outcome);
    }

    outcomes
}

/// Call `after_post_run` on the nodes this graph owns. Nodes flattened in
/// from the graph a post-run group follows get their hook from that graph.
async fn run_after_post_run_hooks(
    graph: &FlatGraph,
    faulted: bool,
    upstream: Option<&Upstream>,
) -> Vec<(String, SharedError)> {
    let mut failures = Vec::new();
    for key in &graph.order {
        let Some(node) = graph.nodes.get(key) else {
            continue;
        };
        let inherited = upstream.is_some_and(|up| {
            up.attempted.contains(key) || up.seen.iter().any(|g| g.ptr_eq(&node.owner))
        });
        if inherited {
            debug!(key = %key, "after_post_run belongs to an upstream graph");
            continue;
        }
        if let Err(err) = Arc::clone(&node.item).after_post_run(faulted).await {
            warn!(key = %key, error = %err, "after_post_run hook failed");
            failures.push((key.clone(), share(err)));
        }
    }
    failures
}

struct Run<'g> {
    graph: &'g FlatGraph,
    states: HashMap<String, RunState>,
    /// Results visible to nodes dispatched from now on.
    completed: HashMap<String, TaskOutput>,
    /// `Some` when running as a post-run dependent.
    group_faulted: Option<bool>,
    dispatch_order: Vec<String>,
}

impl<'g> Run<'g> {
    fn new(graph: &'g FlatGraph, upstream: Option<&Upstream>) -> Self {
        Self {
            graph,
            states: HashMap::new(),
            completed: upstream.map(|u| u.results.clone()).unwrap_or_default(),
            group_faulted: upstream.map(|u| u.faulted),
            dispatch_order: Vec::new(),
        }
    }

    /// Seed per-run state and call the pre-hooks.
    fn prepare(&mut self, ctx: &InvocationContext, upstream: Option<&Upstream>) {
        let graph = self.graph;
        for key in &graph.order {
            let Some(node) = graph.nodes.get(key) else {
                continue;
            };
            let state = match &node.state {
                NodeState::Completed(output) => {
                    debug!(key = %key, "reusing result from earlier invocation");
                    self.completed.insert(key.clone(), Arc::clone(output));
                    ctx.emit(GroupEvent::NodeCompleted {
                        key: key.clone(),
                        reused: true,
                    });
                    RunState::Completed {
                        output: Arc::clone(output),
                        reused: true,
                    }
                }
                NodeState::Faulted(err) => {
                    let attempted = upstream.is_some_and(|u| u.attempted.contains(key));
                    if node.item.is_hot() || attempted {
                        debug!(key = %key, hot = node.item.is_hot(), "keeping cached fault");
                        RunState::Faulted(Arc::clone(err))
                    } else {
                        debug!(key = %key, "retrying cold faulted node");
                        node.owner.set_node_state(key, NodeState::Pending);
                        RunState::Pending
                    }
                }
                NodeState::Pending | NodeState::Running => RunState::Pending,
            };
            self.states.insert(key.clone(), state);
        }

        for key in &graph.order {
            if !matches!(self.states.get(key), Some(RunState::Pending)) {
                continue;
            }
            // Settled earlier in this invocation (skipped behind a fault).
            if upstream.is_some_and(|u| u.attempted.contains(key)) {
                continue;
            }
            if let Some(node) = graph.nodes.get(key) {
                node.item.before_group_invoke();
            }
        }
    }

    async fn drive(&mut self, ctx: &InvocationContext) {
        let mut in_flight: InFlight = FuturesUnordered::new();

        loop {
            self.schedule_ready(ctx, &mut in_flight);

            match in_flight.next().await {
                Some((key, result)) => self.record(ctx, key, result),
                None => break,
            }
        }
    }

    /// Walk nodes in dependency order: skip those behind a fault, dispatch
    /// those whose dependencies all completed.
    fn schedule_ready(&mut self, ctx: &InvocationContext, in_flight: &mut InFlight) {
        let limit = ctx.max_concurrency().unwrap_or(usize::MAX);
        let graph = self.graph;

        for key in &graph.order {
            if !matches!(self.states.get(key), Some(RunState::Pending)) {
                continue;
            }
            let Some(node) = graph.nodes.get(key) else {
                continue;
            };

            let mut blocked_by = None;
            let mut ready = true;
            for dep in &node.deps {
                match self.states.get(dep) {
                    Some(RunState::Completed { .. }) => {}
                    Some(RunState::Faulted(_)) => {
                        blocked_by = Some(dep.clone());
                        break;
                    }
                    Some(RunState::Skipped { dependency }) => {
                        blocked_by = Some(dependency.clone());
                        break;
                    }
                    _ => ready = false,
                }
            }

            if let Some(dependency) = blocked_by {
                debug!(key = %key, dependency = %dependency, "skipping node behind faulted dependency");
                ctx.emit(GroupEvent::NodeSkipped {
                    key: key.clone(),
                    dependency: dependency.clone(),
                });
                self.states
                    .insert(key.clone(), RunState::Skipped { dependency });
                continue;
            }

            if !ready || in_flight.len() >= limit {
                continue;
            }

            let deps = DependencyResults::new(Arc::new(self.completed.clone()), self.group_faulted);
            let work = Arc::clone(&node.item).invoke(deps);
            let pending = ctx.dispatcher().dispatch(key, work);
            let owned_key = key.clone();
            in_flight.push(Box::pin(async move { (owned_key, pending.await) }));

            debug!(key = %key, in_flight = in_flight.len(), "dependencies satisfied; dispatched node");
            node.owner.set_node_state(key, NodeState::Running);
            self.states.insert(key.clone(), RunState::Running);
            self.dispatch_order.push(key.clone());
            ctx.emit(GroupEvent::NodeStarted { key: key.clone() });
        }
    }

    fn record(&mut self, ctx: &InvocationContext, key: String, result: anyhow::Result<TaskOutput>) {
        let graph = self.graph;
        let Some(node) = graph.nodes.get(&key) else {
            return;
        };

        match result {
            Ok(output) => {
                debug!(key = %key, result = output.key(), "node completed");
                node.owner
                    .set_node_state(&key, NodeState::Completed(Arc::clone(&output)));
                self.completed.insert(key.clone(), Arc::clone(&output));
                self.states.insert(
                    key.clone(),
                    RunState::Completed {
                        output,
                        reused: false,
                    },
                );
                ctx.emit(GroupEvent::NodeCompleted { key, reused: false });
            }
            Err(err) => {
                warn!(key = %key, error = %err, "node faulted; skipping its dependents");
                let error = share(err);
                node.owner
                    .set_node_state(&key, NodeState::Faulted(Arc::clone(&error)));
                ctx.emit(GroupEvent::NodeFaulted {
                    key: key.clone(),
                    error: error.to_string(),
                });
                self.states.insert(key, RunState::Faulted(error));
            }
        }
    }

    fn faulted(&self) -> bool {
        self.states
            .values()
            .any(|s| matches!(s, RunState::Faulted(_) | RunState::Skipped { .. }))
    }

    /// Nodes that were run or settled in this run.
    fn attempted(&self) -> HashSet<String> {
        self.states
            .iter()
            .filter(|(_, s)| !matches!(s, RunState::Pending))
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn into_outcome(
        self,
        post_run: Vec<Result<GroupOutcome>>,
        hook_failures: Vec<(String, SharedError)>,
    ) -> GroupOutcome {
        let faulted = self.faulted();
        let root_key = self.graph.root_key.clone();

        let root = match self.states.get(&root_key) {
            Some(RunState::Completed { output, .. }) => Ok(Arc::clone(output)),
            Some(RunState::Faulted(err)) => Err(GraphError::TaskFaulted {
                key: root_key.clone(),
                source: Arc::clone(err),
            }),
            Some(RunState::Skipped { dependency }) => Err(GraphError::DependencyFaulted {
                key: root_key.clone(),
                dependency: dependency.clone(),
            }),
            _ => Err(GraphError::Configuration(format!(
                "root '{root_key}' did not run"
            ))),
        };

        let nodes: BTreeMap<String, NodeOutcome> = self
            .states
            .into_iter()
            .filter_map(|(key, state)| {
                let outcome = match state {
                    RunState::Completed { output, reused } => NodeOutcome::Completed { output, reused },
                    RunState::Faulted(err) => NodeOutcome::Faulted(err),
                    RunState::Skipped { dependency } => NodeOutcome::Skipped { dependency },
                    RunState::Pending | RunState::Running => return None,
                };
                Some((key, outcome))
            })
            .collect();

        GroupOutcome {
            root_key,
            root,
            nodes,
            dispatch_order: self.dispatch_order,
            faulted,
            post_run,
            hook_failures,
        }
    }
}

/// Marks every group of a graph as being invoked for the guard's lifetime.
struct InvokeGuard {
    groups: Vec<TaskGroup>,
}

impl InvokeGuard {
    fn acquire(groups: &[TaskGroup]) -> Result<Self> {
        let mut held: Vec<TaskGroup> = Vec::new();
        for group in groups {
            if !group.try_begin_invoke() {
                for h in &held {
                    h.end_invoke();
                }
                return Err(GraphError::Configuration(format!(
                    "task group '{}' is already being invoked",
                    group.key()
                )));
            }
            held.push(group.clone());
        }
        Ok(Self { groups: held })
    }
}

impl Drop for InvokeGuard {
    fn drop(&mut self) {
        for group in &self.groups {
            group.end_invoke();
        }
    }
}
