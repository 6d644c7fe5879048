#![allow(dead_code)]

use std::collections::BTreeMap;
use taskgroup::config::{ConfigFile, EngineConfig, PollerConfig, RawConfigFile, TaskConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                engine: EngineConfig::default(),
                poller: PollerConfig::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_root(mut self, root: &str) -> Self {
        self.config.engine.root = Some(root.to_string());
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.config.engine.max_concurrency = Some(limit);
        self
    }

    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.config.poller.default_interval_secs = secs;
        self
    }

    /// The raw form, for exercising validation failures.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
#[derive(Default)]
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.task.delay_ms = ms;
        self
    }

    pub fn failing(mut self) -> Self {
        self.task.fail = true;
        self
    }

    pub fn post_run_of(mut self, target: &str) -> Self {
        self.task.post_run_of = Some(target.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
