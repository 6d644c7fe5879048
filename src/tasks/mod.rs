// src/tasks/mod.rs

//! Task items and the adapters that turn domain operations into them.
//!
//! - [`item`] defines the [`TaskItem`] contract.
//! - [`function`] wraps an async closure.
//! - [`create_update`] runs a create or an update chosen at build time.
//! - [`execute`] runs a single action.

pub mod create_update;
pub mod execute;
pub mod function;
pub mod item;

pub use create_update::{CreateUpdateTask, Operation, ResourceCreatorUpdater, ResourceFuture};
pub use execute::{ExecuteTask, Executor};
pub use function::FunctionTask;
pub use item::{HookFuture, TaskItem, WorkFuture};
