// tests/post_run.rs

mod common;
use crate::common::{RecordingTask, RunLog, group, init_tracing, with_timeout};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use taskgroup::exec::InvocationContext;
use taskgroup::graph::{GroupEvent, NodeOutcome};
use taskgroup::indexable::{Indexable, IndexableRef};
use taskgroup::TaskOutput;
use tokio::sync::mpsc;

#[tokio::test]
async fn post_run_dependent_runs_once_after_a_successful_group() {
    init_tracing();
    let log = RunLog::new();
    let root = RecordingTask::new("root", &log).arc();
    let dep = RecordingTask::new("dep", &log).arc();
    let audit = RecordingTask::new("audit", &log).arc();

    let g = group(&root);
    g.add_dependency_group(&group(&dep));
    g.add_post_run_dependent_group(&group(&audit));

    let outcome = with_timeout(g.invoke_detailed(&InvocationContext::tokio()))
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(audit.invocations(), 1);
    assert_eq!(log.entries(), vec!["dep", "root", "audit"]);

    let seen = &audit.observations()[0];
    assert!(seen.is_post_run);
    assert!(!seen.group_faulted);
    assert_eq!(seen.visible, vec!["dep".to_string(), "root".to_string()]);

    assert_eq!(outcome.post_run.len(), 1);
    assert!(!outcome.post_run_faulted());
}

#[tokio::test]
async fn after_post_run_hooks_see_the_faulted_flag() {
    init_tracing();
    let log = RunLog::new();
    let root = RecordingTask::new("root", &log).arc();
    let broken = RecordingTask::new("broken", &log).failing().arc();
    let audit = RecordingTask::new("audit", &log).arc();

    let g = group(&root);
    g.add_dependency_group(&group(&broken));
    g.add_post_run_dependent_group(&group(&audit));

    let outcome = g.invoke_detailed(&InvocationContext::inline()).await.unwrap();

    assert!(outcome.faulted);
    assert_eq!(root.after_post_run_calls(), vec![true]);
    assert_eq!(broken.after_post_run_calls(), vec![true]);
    // The post-run group's own graph did not fault.
    assert_eq!(audit.after_post_run_calls(), vec![false]);
    assert!(audit.observations()[0].group_faulted);
}

#[tokio::test]
async fn after_post_run_runs_after_the_post_run_dependents() {
    init_tracing();
    let order = Arc::new(std::sync::Mutex::new(Vec::<String>::new()));

    struct Hooked {
        name: &'static str,
        order: Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl taskgroup::TaskItem for Hooked {
        fn invoke(self: Arc<Self>, _deps: taskgroup::DependencyResults) -> taskgroup::tasks::WorkFuture {
            Box::pin(async move {
                self.order.lock().unwrap().push(format!("work:{}", self.name));
                Ok(Arc::new(IndexableRef::new(self.name)) as TaskOutput)
            })
        }

        fn after_post_run(self: Arc<Self>, _faulted: bool) -> taskgroup::tasks::HookFuture {
            Box::pin(async move {
                self.order.lock().unwrap().push(format!("hook:{}", self.name));
                Ok(())
            })
        }
    }

    let g = taskgroup::TaskGroup::new(
        "main",
        Arc::new(Hooked {
            name: "main",
            order: Arc::clone(&order),
        }),
    );
    g.add_post_run_dependent(Arc::new(Hooked {
        name: "post",
        order: Arc::clone(&order),
    }));

    g.invoke(&InvocationContext::inline()).await.unwrap();

    assert_eq!(
        *order.lock().unwrap(),
        vec!["work:main", "work:post", "hook:post", "hook:main"]
    );
}

#[tokio::test]
async fn post_run_fault_does_not_change_the_root_result() {
    init_tracing();
    let log = RunLog::new();
    let root = RecordingTask::new("root", &log).arc();
    let notify = RecordingTask::new("notify", &log).failing().arc();

    let g = group(&root);
    g.add_post_run_dependent_group(&group(&notify));

    let outcome = g.invoke_detailed(&InvocationContext::tokio()).await.unwrap();

    assert_eq!(outcome.root.as_ref().unwrap().key(), "root");
    assert!(!outcome.faulted);
    assert!(outcome.post_run_faulted());
    assert_eq!(notify.invocations(), 1);
}

#[tokio::test]
async fn post_run_group_can_depend_on_the_group_it_follows() {
    init_tracing();
    let log = RunLog::new();
    let vm = RecordingTask::new("vm", &log).arc();
    let snapshot = RecordingTask::new("snapshot", &log).arc();

    let g_vm = group(&vm);
    let g_snapshot = group(&snapshot);
    g_snapshot.add_dependency_group(&g_vm);
    g_vm.add_post_run_dependent_group(&g_snapshot);

    let outcome = g_vm.invoke_detailed(&InvocationContext::tokio()).await.unwrap();

    assert_eq!(vm.invocations(), 1);
    assert_eq!(snapshot.invocations(), 1);
    let nested = outcome.post_run[0].as_ref().unwrap();
    assert!(matches!(
        nested.node("vm"),
        Some(NodeOutcome::Completed { reused: true, .. })
    ));
    assert!(snapshot.observations()[0].visible.contains(&"vm".to_string()));
    assert_eq!(vm.after_post_run_calls(), vec![false]);
    assert_eq!(snapshot.after_post_run_calls(), vec![false]);
}

#[tokio::test]
async fn post_run_group_behind_a_fault_is_skipped_without_retrying() {
    init_tracing();
    let log = RunLog::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let g_vm = taskgroup::TaskGroup::from_fn("vm", move |_deps| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Err::<TaskOutput, _>(anyhow::anyhow!("quota exceeded")) }
    });
    let rollback = RecordingTask::new("rollback", &log).arc();
    let g_rollback = group(&rollback);
    g_rollback.add_dependency_group(&g_vm);
    g_vm.add_post_run_dependent_group(&g_rollback);

    let outcome = g_vm.invoke_detailed(&InvocationContext::tokio()).await.unwrap();

    // The faulted node is not retried within the same invocation.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(rollback.invocations(), 0);
    let nested = outcome.post_run[0].as_ref().unwrap();
    assert!(nested.node("rollback").is_some_and(NodeOutcome::is_skipped));
    assert!(outcome.post_run_faulted());
}

#[tokio::test]
async fn post_run_start_event_carries_the_flag() {
    let log = RunLog::new();
    let root = RecordingTask::new("root", &log).failing().arc();
    let audit = RecordingTask::new("audit", &log).arc();
    let g = group(&root);
    g.add_post_run_dependent_group(&group(&audit));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let ctx = InvocationContext::inline().with_events(tx);
    let _ = g.invoke(&ctx).await;
    drop(ctx);

    let mut saw_start = false;
    while let Some(event) = rx.recv().await {
        if let GroupEvent::PostRunStarted { key, group_faulted } = event {
            assert_eq!(key, "audit");
            assert!(group_faulted);
            saw_start = true;
        }
    }
    assert!(saw_start);
}
