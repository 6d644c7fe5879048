// tests/create_update_tasks.rs

mod common;
use crate::common::{ScriptedOperationClient, init_tracing, with_timeout};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;
use taskgroup::errors::GraphError;
use taskgroup::exec::InvocationContext;
use taskgroup::graph::{DependencyResults, HasTaskGroup, ProducesResult, TaskGroup};
use taskgroup::indexable::{Indexable, IndexableRef, IndexableWrapper};
use taskgroup::lro::{Accepted, HttpResponse, Poller};
use taskgroup::tasks::{
    CreateUpdateTask, ExecuteTask, Executor, Operation, ResourceCreatorUpdater, ResourceFuture,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct DiskModel {
    name: String,
    size_gb: u32,
}

type Disk = IndexableWrapper<DiskModel>;

#[derive(Debug, Clone)]
struct DiskSpec {
    name: String,
    size_gb: u32,
}

fn disk(name: &str, size_gb: u32) -> Disk {
    IndexableWrapper::with_key(
        name,
        DiskModel {
            name: name.to_string(),
            size_gb,
        },
    )
}

#[derive(Debug, Default)]
struct DiskService {
    creates: AtomicUsize,
    updates: AtomicUsize,
    before: AtomicUsize,
}

impl ResourceCreatorUpdater for DiskService {
    type Definition = DiskSpec;
    type Resource = Disk;

    fn before_group_create_or_update(&self) {
        self.before.fetch_add(1, Ordering::SeqCst);
    }

    fn create_resource(
        self: Arc<Self>,
        definition: DiskSpec,
        _deps: DependencyResults,
    ) -> ResourceFuture<Disk> {
        Box::pin(async move {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(disk(&definition.name, definition.size_gb)))
        })
    }

    fn update_resource(
        self: Arc<Self>,
        changes: DiskSpec,
        current: Arc<Disk>,
        _deps: DependencyResults,
    ) -> ResourceFuture<Disk> {
        Box::pin(async move {
            self.updates.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(disk(current.key(), changes.size_gb)))
        })
    }
}

#[tokio::test]
async fn create_operation_calls_create() {
    init_tracing();
    let service = Arc::new(DiskService::default());
    let task = CreateUpdateTask::create(
        Arc::clone(&service),
        DiskSpec {
            name: "osdisk".into(),
            size_gb: 128,
        },
    );
    assert!(task.is_in_create_mode());
    assert!(task.operation().is_create());
    let g = TaskGroup::new("osdisk", Arc::new(task));

    let created = g
        .invoke_typed::<Disk>(&InvocationContext::tokio())
        .await
        .unwrap();

    assert_eq!(created.inner().size_gb, 128);
    assert_eq!(service.creates.load(Ordering::SeqCst), 1);
    assert_eq!(service.updates.load(Ordering::SeqCst), 0);
    assert_eq!(service.before.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn update_operation_calls_update_with_current_state() {
    init_tracing();
    let service = Arc::new(DiskService::default());
    let current = Arc::new(disk("datadisk", 64));
    let op = Operation::Update {
        changes: DiskSpec {
            name: "ignored".into(),
            size_gb: 256,
        },
        current: Arc::clone(&current),
    };
    let g = TaskGroup::new(
        "datadisk",
        Arc::new(CreateUpdateTask::new(Arc::clone(&service), op)),
    );

    let updated = g
        .invoke_typed::<Disk>(&InvocationContext::inline())
        .await
        .unwrap();

    assert_eq!(updated.key(), "datadisk");
    assert_eq!(updated.inner().size_gb, 256);
    assert_eq!(service.creates.load(Ordering::SeqCst), 0);
    assert_eq!(service.updates.load(Ordering::SeqCst), 1);
}

/// Supports create only.
struct PublicIpService;

impl ResourceCreatorUpdater for PublicIpService {
    type Definition = String;
    type Resource = IndexableRef;

    fn create_resource(self: Arc<Self>, name: String, _deps: DependencyResults) -> ResourceFuture<IndexableRef> {
        Box::pin(async move { Ok(Arc::new(IndexableRef::new(name))) })
    }
}

#[tokio::test]
async fn unsupported_update_faults_the_node() {
    let task = CreateUpdateTask::update(
        Arc::new(PublicIpService),
        "pip".to_string(),
        Arc::new(IndexableRef::new("pip")),
    );
    let g = TaskGroup::new("pip", Arc::new(task));

    let err = g.invoke(&InvocationContext::inline()).await.unwrap_err();

    match err {
        GraphError::TaskFaulted { key, source } => {
            assert_eq!(key, "pip");
            assert!(source.to_string().contains("does not support update"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Creates a disk through a long-running operation.
struct LroDiskService {
    client: Arc<ScriptedOperationClient>,
}

impl ResourceCreatorUpdater for LroDiskService {
    type Definition = DiskSpec;
    type Resource = Disk;

    fn create_resource(self: Arc<Self>, _definition: DiskSpec, _deps: DependencyResults) -> ResourceFuture<Disk> {
        Box::pin(async move {
            let activation = HttpResponse::new(202).with_header("Retry-After", "1");
            let poller: Poller<DiskModel, DiskModel> =
                Poller::new(activation, self.client.clone());
            let mut accepted = Accepted::new(poller, |model: Arc<DiskModel>| {
                IndexableWrapper::with_key(model.name.clone(), (*model).clone())
            });
            let created = accepted.final_result().await?;
            Ok(created)
        })
    }
}

#[tokio::test(start_paused = true)]
async fn create_can_wait_on_a_long_running_operation() {
    init_tracing();
    let client = Arc::new(ScriptedOperationClient::new([
        HttpResponse::new(202).with_header("Retry-After", "1"),
        HttpResponse::new(200).with_body(r#"{"name":"bigdisk","size_gb":1024}"#),
    ]));
    let service = Arc::new(LroDiskService {
        client: Arc::clone(&client),
    });
    let g = TaskGroup::new(
        "bigdisk",
        Arc::new(CreateUpdateTask::create(
            service,
            DiskSpec {
                name: "bigdisk".into(),
                size_gb: 1024,
            },
        )),
    );

    let created = with_timeout(g.invoke_typed::<Disk>(&InvocationContext::tokio()))
        .await
        .unwrap();

    assert_eq!(created.key(), "bigdisk");
    assert_eq!(created.inner().size_gb, 1024);
    assert_eq!(client.polls(), 2);
}

// Capability traits: domain objects own a group and merge groups to
// declare what they need.

struct Network {
    group: TaskGroup,
}

impl Network {
    fn new(name: &str) -> Self {
        let key = name.to_string();
        Self {
            group: TaskGroup::from_fn(name, move |_deps| {
                let key = key.clone();
                async move { Ok(Arc::new(IndexableRef::new(key)) as taskgroup::TaskOutput) }
            }),
        }
    }
}

impl HasTaskGroup for Network {
    fn task_group(&self) -> &TaskGroup {
        &self.group
    }
}

type VmInfo = IndexableWrapper<String>;

struct Attach {
    vm: String,
    network: String,
}

impl Executor for Attach {
    type Output = VmInfo;

    fn execute_work(self: Arc<Self>, deps: DependencyResults) -> ResourceFuture<VmInfo> {
        Box::pin(async move {
            let net = deps
                .get_as::<IndexableRef>(&self.network)
                .ok_or_else(|| anyhow::anyhow!("network '{}' missing", self.network))?;
            Ok(Arc::new(IndexableWrapper::with_key(
                self.vm.clone(),
                format!("{} attached to {}", self.vm, net.key()),
            )))
        })
    }
}

struct VirtualMachine {
    group: TaskGroup,
}

impl VirtualMachine {
    fn new(name: &str, network: &str) -> Self {
        let attach = Attach {
            vm: name.to_string(),
            network: network.to_string(),
        };
        Self {
            group: TaskGroup::new(name, Arc::new(ExecuteTask::new(Arc::new(attach)))),
        }
    }
}

impl HasTaskGroup for VirtualMachine {
    fn task_group(&self) -> &TaskGroup {
        &self.group
    }
}

impl ProducesResult for VirtualMachine {
    type Output = VmInfo;
}

#[tokio::test]
async fn capability_objects_compose_by_merging_groups() {
    init_tracing();
    let net = Network::new("vnet");
    let vm = VirtualMachine::new("vm1", "vnet");
    vm.depends_on(&net);

    let info = vm.execute(&InvocationContext::tokio()).await.unwrap();

    assert_eq!(info.key(), "vm1");
    assert_eq!(info.inner(), "vm1 attached to vnet");
}

#[tokio::test]
async fn typed_invoke_rejects_the_wrong_type() {
    let net = Network::new("vnet");

    let err = net
        .task_group()
        .invoke_typed::<VmInfo>(&InvocationContext::inline())
        .await
        .unwrap_err();

    assert!(matches!(err, GraphError::Configuration(_)));
}
