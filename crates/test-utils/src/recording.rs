//! A [`TaskItem`] that records what the engine did with it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskgroup::graph::DependencyResults;
use taskgroup::indexable::{IndexableRef, TaskOutput};
use taskgroup::tasks::{HookFuture, TaskItem, WorkFuture};

/// Shared log of which recording tasks ran, in completion order.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    inner: Arc<Mutex<Vec<String>>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, name: &str) {
        self.inner.lock().unwrap().push(name.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.inner.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.inner.lock().unwrap().iter().filter(|n| *n == name).count()
    }

    /// Position of `name` in the log. Panics if it never ran.
    pub fn position(&self, name: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .position(|n| n == name)
            .unwrap_or_else(|| panic!("task '{name}' never ran"))
    }
}

/// What a recording task saw on one run.
#[derive(Debug, Clone)]
pub struct Observation {
    pub visible: Vec<String>,
    pub is_post_run: bool,
    pub group_faulted: bool,
}

/// Configurable task item for engine tests.
///
/// Its output is an [`IndexableRef`] keyed by the task's name.
#[derive(Debug)]
pub struct RecordingTask {
    name: String,
    log: RunLog,
    delay: Duration,
    fail: bool,
    hot: bool,
    invocations: AtomicUsize,
    before_hooks: AtomicUsize,
    observations: Mutex<Vec<Observation>>,
    after_post_run: Mutex<Vec<bool>>,
    concurrency: Option<Arc<ConcurrencyProbe>>,
}

impl RecordingTask {
    pub fn new(name: &str, log: &RunLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            delay: Duration::ZERO,
            fail: false,
            hot: false,
            invocations: AtomicUsize::new(0),
            before_hooks: AtomicUsize::new(0),
            observations: Mutex::new(Vec::new()),
            after_post_run: Mutex::new(Vec::new()),
            concurrency: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn hot(mut self) -> Self {
        self.hot = true;
        self
    }

    pub fn with_probe(mut self, probe: &Arc<ConcurrencyProbe>) -> Self {
        self.concurrency = Some(Arc::clone(probe));
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn before_hooks(&self) -> usize {
        self.before_hooks.load(Ordering::SeqCst)
    }

    pub fn observations(&self) -> Vec<Observation> {
        self.observations.lock().unwrap().clone()
    }

    /// `is_group_faulted` flags passed to `after_post_run`, in call order.
    pub fn after_post_run_calls(&self) -> Vec<bool> {
        self.after_post_run.lock().unwrap().clone()
    }
}

impl TaskItem for RecordingTask {
    fn before_group_invoke(&self) {
        self.before_hooks.fetch_add(1, Ordering::SeqCst);
    }

    fn is_hot(&self) -> bool {
        self.hot
    }

    fn invoke(self: Arc<Self>, deps: DependencyResults) -> WorkFuture {
        Box::pin(async move {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            let mut visible: Vec<String> = deps.keys().map(str::to_string).collect();
            visible.sort();
            self.observations.lock().unwrap().push(Observation {
                visible,
                is_post_run: deps.is_post_run(),
                group_faulted: deps.group_faulted(),
            });

            let _slot = self.concurrency.as_ref().map(|p| p.enter());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            if self.fail {
                anyhow::bail!("task '{}' failed", self.name);
            }
            self.log.push(&self.name);
            let output: TaskOutput = Arc::new(IndexableRef::new(self.name.clone()));
            Ok(output)
        })
    }

    fn after_post_run(self: Arc<Self>, is_group_faulted: bool) -> HookFuture {
        Box::pin(async move {
            self.after_post_run.lock().unwrap().push(is_group_faulted);
            Ok(())
        })
    }
}

/// Tracks how many tasks are inside their work at once.
#[derive(Debug, Default)]
pub struct ConcurrencyProbe {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) -> ProbeSlot<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        ProbeSlot { probe: self }
    }
}

struct ProbeSlot<'a> {
    probe: &'a ConcurrencyProbe,
}

impl Drop for ProbeSlot<'_> {
    fn drop(&mut self) {
        self.probe.current.fetch_sub(1, Ordering::SeqCst);
    }
}
