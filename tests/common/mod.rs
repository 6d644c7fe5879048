#![allow(dead_code)]

use std::sync::Arc;

use taskgroup::graph::TaskGroup;

pub use taskgroup_test_utils::builders;
pub use taskgroup_test_utils::fake_client::ScriptedOperationClient;
pub use taskgroup_test_utils::recording::{ConcurrencyProbe, Observation, RecordingTask, RunLog};
pub use taskgroup_test_utils::{init_tracing, with_timeout};

/// A group whose root is `task`, keyed by the task's name.
pub fn group(task: &Arc<RecordingTask>) -> TaskGroup {
    TaskGroup::new(task.name(), Arc::clone(task) as Arc<dyn taskgroup::TaskItem>)
}
