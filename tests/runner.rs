// tests/runner.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::{init_tracing, with_timeout};

use taskgroup::engine::{self, SimulatedOutput};
use taskgroup::errors::GraphError;
use taskgroup::exec::InvocationContext;

#[tokio::test]
async fn runs_configured_graph_in_dependency_order() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_task("vnet", TaskConfigBuilder::new().delay_ms(5).build())
        .with_task("disk", TaskConfigBuilder::new().build())
        .with_task(
            "vm",
            TaskConfigBuilder::new().after("vnet").after("disk").build(),
        )
        .build();

    let root = engine::resolve_root(&cfg, None).unwrap();
    assert_eq!(root, "vm");

    let report = with_timeout(engine::run_config(&cfg, root, &InvocationContext::tokio()))
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.lines.len(), 3);
    assert_eq!(report.lines.last().map(|l| l.key.as_str()), Some("vm"));
    assert!(report.lines.iter().all(|l| l.status == "completed"));
    assert!(report.to_string().starts_with("root 'vm': succeeded"));
}

#[tokio::test]
async fn simulated_failure_is_reported_and_post_run_still_runs() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_task("vnet", TaskConfigBuilder::new().failing().build())
        .with_task("vm", TaskConfigBuilder::new().after("vnet").build())
        .with_task("cleanup", TaskConfigBuilder::new().post_run_of("vm").build())
        .build();

    let report = engine::run_config(&cfg, "vm", &InvocationContext::tokio())
        .await
        .unwrap();

    assert!(!report.success);
    assert!(report.faulted);
    assert_eq!(report.line("vnet").unwrap().status, "faulted");
    let vm = report.line("vm").unwrap();
    assert_eq!(vm.status, "skipped");
    assert_eq!(vm.detail.as_deref(), Some("dependency 'vnet' faulted"));
    let cleanup = report.line("cleanup").unwrap();
    assert_eq!(cleanup.status, "completed");
    assert!(cleanup.post_run);
}

#[tokio::test]
async fn post_run_task_sees_the_fault_flag() {
    let cfg = ConfigFileBuilder::new()
        .with_task("vm", TaskConfigBuilder::new().failing().build())
        .with_task("cleanup", TaskConfigBuilder::new().post_run_of("vm").build())
        .build();

    let groups = engine::build_groups(&cfg);
    groups["vm"]
        .invoke_detailed(&InvocationContext::inline())
        .await
        .unwrap();

    let cleanup = groups["cleanup"]
        .task_result_as::<SimulatedOutput>("cleanup")
        .expect("cleanup completed");
    assert!(cleanup.inner().after_fault);
}

#[tokio::test]
async fn dependents_see_their_inputs() {
    let cfg = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::new().build())
        .with_task("b", TaskConfigBuilder::new().after("a").build())
        .build();

    let groups = engine::build_groups(&cfg);
    groups["b"].invoke(&InvocationContext::inline()).await.unwrap();

    let b = groups["b"].task_result_as::<SimulatedOutput>("b").unwrap();
    assert_eq!(b.inner().inputs, vec!["a".to_string()]);
    assert!(!b.inner().after_fault);
}

#[tokio::test]
async fn configured_cycle_fails_at_invocation() {
    let cfg = ConfigFileBuilder::new()
        .with_root("a")
        .with_task("a", TaskConfigBuilder::new().after("b").build())
        .with_task("b", TaskConfigBuilder::new().after("a").build())
        .build();

    let err = with_timeout(engine::run_config(&cfg, "a", &InvocationContext::tokio()))
        .await
        .unwrap_err();

    assert!(matches!(err, GraphError::CyclicGraph(_)));
}

#[test]
fn root_resolution() {
    let cfg = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::new().build())
        .with_task("b", TaskConfigBuilder::new().build())
        .build();

    // Two candidates and no explicit root.
    assert!(engine::resolve_root(&cfg, None).unwrap_err().is_configuration());
    assert_eq!(engine::resolve_root(&cfg, Some("b")).unwrap(), "b");
    assert!(engine::resolve_root(&cfg, Some("zzz")).is_err());
}

#[test]
fn concurrency_limit_comes_from_engine_config() {
    let cfg = ConfigFileBuilder::new()
        .with_max_concurrency(3)
        .with_task("a", TaskConfigBuilder::new().build())
        .build();

    let ctx = InvocationContext::from_config(&cfg.engine);
    assert_eq!(ctx.max_concurrency(), Some(3));
}
