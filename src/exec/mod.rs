// src/exec/mod.rs

//! Execution layer.
//!
//! - [`backend`] provides the [`Dispatcher`] trait with a Tokio-spawning
//!   implementation for production and an inline one for tests.
//! - [`context`] bundles the dispatcher with per-invocation settings
//!   (concurrency window, event stream).
//! - [`blocking`] runs async entry points from synchronous code.

pub mod backend;
pub mod blocking;
pub mod context;

pub use backend::{Dispatcher, InlineDispatcher, TokioDispatcher};
pub use blocking::block_on;
pub use context::InvocationContext;
