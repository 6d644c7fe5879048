// tests/property_graph.rs

mod common;
use crate::common::{RecordingTask, RunLog, group};

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use taskgroup::exec::InvocationContext;
use taskgroup::graph::TaskGroup;

// Random DAGs: node N may only depend on nodes 0..N, so every generated
// graph is acyclic. Node 0 is the root.
fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = (Vec<Vec<usize>>, BTreeSet<usize>)> {
    (1..=max_nodes).prop_flat_map(|n| {
        let deps = proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), n);
        let failing = proptest::collection::btree_set(0..n, 0..=n / 3);
        (deps, failing).prop_map(move |(raw, failing)| {
            // Reverse the direction so that node i depends on higher indices,
            // keeping node 0 as the sink everything flows into.
            let deps = raw
                .into_iter()
                .enumerate()
                .map(|(i, picks)| {
                    let remaining = n - i - 1;
                    let mut d: Vec<usize> = picks
                        .into_iter()
                        .filter(|_| remaining > 0)
                        .map(|p| i + 1 + p % remaining.max(1))
                        .collect();
                    d.sort_unstable();
                    d.dedup();
                    d
                })
                .collect();
            (deps, failing)
        })
    })
}

struct Built {
    log: RunLog,
    tasks: Vec<Arc<RecordingTask>>,
    groups: Vec<TaskGroup>,
}

fn build(deps: &[Vec<usize>], failing: &BTreeSet<usize>) -> Built {
    let log = RunLog::new();
    let tasks: Vec<Arc<RecordingTask>> = (0..deps.len())
        .map(|i| {
            let task = RecordingTask::new(&format!("n{i}"), &log);
            if failing.contains(&i) {
                task.failing().arc()
            } else {
                task.arc()
            }
        })
        .collect();
    let groups: Vec<TaskGroup> = tasks.iter().map(group).collect();
    for (i, d) in deps.iter().enumerate() {
        for j in d {
            groups[i].add_dependency_group(&groups[*j]);
        }
    }
    Built { log, tasks, groups }
}

/// Nodes reachable from node 0, including itself.
fn reachable(deps: &[Vec<usize>]) -> BTreeSet<usize> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![0];
    while let Some(i) = stack.pop() {
        if seen.insert(i) {
            stack.extend(deps[i].iter().copied());
        }
    }
    seen
}

/// Whether `i` transitively depends on a failing node (or fails itself).
fn tainted(i: usize, deps: &[Vec<usize>], failing: &BTreeSet<usize>) -> bool {
    failing.contains(&i) || deps[i].iter().any(|&j| tainted(j, deps, failing))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_node_runs_at_most_once_and_after_its_dependencies(
        (deps, failing) in dag_strategy(8)
    ) {
        let built = build(&deps, &failing);
        let _ = built.groups[0].invoke_blocking(&InvocationContext::inline());

        let reach = reachable(&deps);
        for (i, task) in built.tasks.iter().enumerate() {
            prop_assert!(task.invocations() <= 1, "n{} ran {} times", i, task.invocations());
            if !reach.contains(&i) {
                prop_assert_eq!(task.invocations(), 0);
                continue;
            }

            let should_run = !deps[i].iter().any(|&j| tainted(j, &deps, &failing));
            prop_assert_eq!(task.invocations() == 1, should_run, "n{}", i);

            if should_run && !failing.contains(&i) {
                let me = built.log.position(&format!("n{i}"));
                for &j in &deps[i] {
                    let dep_pos = built.log.position(&format!("n{j}"));
                    prop_assert!(dep_pos < me);
                }
            }
        }
    }

    #[test]
    fn root_result_matches_fault_propagation(
        (deps, failing) in dag_strategy(8)
    ) {
        let built = build(&deps, &failing);
        let result = built.groups[0].invoke_blocking(&InvocationContext::inline());
        prop_assert_eq!(result.is_ok(), !tainted(0, &deps, &failing));
    }
}
