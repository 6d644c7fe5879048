// src/graph/mod.rs

//! Task graph representation and invocation.
//!
//! - [`group`] holds [`TaskGroup`], the shared handle callers build graphs with.
//! - [`node`] holds node bookkeeping and the public status/outcome types.
//! - [`flatten`] merges dependency groups into one ordered graph and rejects
//!   cycles.
//! - [`invoker`] is the per-invocation state machine.
//! - [`results`] is the read-only result view handed to node work.
//! - [`events`] are the progress events streamed during an invocation.
//! - [`outcome`] describes a finished invocation.
//! - [`capability`] has the traits domain objects implement to take part.

pub mod capability;
pub mod events;
pub(crate) mod flatten;
pub mod group;
pub(crate) mod invoker;
pub mod node;
pub mod outcome;
pub mod results;

pub use capability::{HasTaskGroup, ProducesResult};
pub use events::GroupEvent;
pub use group::TaskGroup;
pub use node::{NodeOutcome, NodeStatus};
pub use outcome::GroupOutcome;
pub use results::DependencyResults;
