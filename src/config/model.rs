// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::lro::DEFAULT_POLL_INTERVAL;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [engine]
/// max_concurrency = 4
/// root = "vm"
///
/// [poller]
/// default_interval_secs = 30
///
/// [task.vnet]
/// delay_ms = 50
///
/// [task.vm]
/// after = ["vnet"]
/// ```
///
/// All sections are optional except that at least one task must exist.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub poller: PollerConfig,

    /// All tasks from `[task.<name>]`, keyed by name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration. Build one with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub engine: EngineConfig,
    pub poller: PollerConfig,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        engine: EngineConfig,
        poller: PollerConfig,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self {
            engine,
            poller,
            task,
        }
    }

    /// Root task: `[engine].root`, or the single task nothing depends on.
    pub fn root_task(&self) -> Option<&str> {
        if let Some(root) = &self.engine.root {
            return Some(root.as_str());
        }
        let mut candidates = self
            .task
            .iter()
            .filter(|(name, task)| {
                task.post_run_of.is_none() && !self.task.values().any(|t| t.after.contains(*name))
            })
            .map(|(name, _)| name);
        let first = candidates.next()?;
        match candidates.next() {
            Some(_) => None,
            None => Some(first.as_str()),
        }
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Upper bound on sibling nodes in flight. Unlimited when absent.
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Task the runner invokes.
    #[serde(default)]
    pub root: Option<String>,
}

/// `[poller]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollerConfig {
    /// Seconds between status requests when the service sends no
    /// `Retry-After`.
    #[serde(default = "default_interval_secs")]
    pub default_interval_secs: u64,

    /// Overall bound on waiting for an operation.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

impl PollerConfig {
    pub fn default_interval(&self) -> Duration {
        Duration::from_secs(self.default_interval_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            default_interval_secs: default_interval_secs(),
            timeout_secs: None,
        }
    }
}

/// `[task.<name>]` section: one simulated unit of work for the runner.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Tasks that must complete before this one.
    #[serde(default)]
    pub after: Vec<String>,

    /// Simulated latency in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,

    /// Fail instead of completing.
    #[serde(default)]
    pub fail: bool,

    /// Run as a post-run dependent of the named task instead of as part of
    /// the main graph.
    #[serde(default)]
    pub post_run_of: Option<String>,
}
