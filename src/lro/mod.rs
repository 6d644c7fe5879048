// src/lro/mod.rs

//! Long-running operation tracking.
//!
//! - [`response`] is the HTTP-shaped input (status, headers, body).
//! - [`status`] maps responses onto [`OperationStatus`].
//! - [`client`] is the caller-supplied way to re-issue status requests.
//! - [`serializer`] turns bodies into typed values.
//! - [`poller`] is the polling state machine.
//! - [`accepted`] wraps a poller and converts the final model for callers.
//! - [`error`] holds [`LroError`] and the normalized [`ManagementError`].

pub mod accepted;
pub mod client;
pub mod error;
pub mod poller;
pub mod response;
pub mod serializer;
pub mod status;

pub use accepted::Accepted;
pub use client::{ClientFuture, OperationClient};
pub use error::{LroError, ManagementError};
pub use poller::{DEFAULT_POLL_INTERVAL, PollResponse, Poller};
pub use response::HttpResponse;
pub use serializer::{JsonSerializer, SerializerAdapter};
pub use status::OperationStatus;
