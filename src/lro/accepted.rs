// src/lro/accepted.rs

//! Caller-facing handle for an accepted long-running operation.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::error::LroError;
use super::poller::{PollResponse, Poller};
use super::status::OperationStatus;
use crate::errors::Result;
use crate::exec::blocking::block_on;

type WrapFn<I, T> = Box<dyn Fn(Arc<I>) -> T + Send + Sync>;

/// An operation the service has accepted but not yet finished.
///
/// `P` is the body of status responses while the operation runs, `I` the
/// service model of the final response, and `T` what callers get back once
/// `wrap` has been applied to the final model.
pub struct Accepted<P, I, T> {
    poller: Poller<P, I>,
    wrap: WrapFn<I, T>,
    wrapped: Option<Arc<T>>,
}

impl<P, I, T> std::fmt::Debug for Accepted<P, I, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accepted")
            .field("poller", &self.poller)
            .field("has_result", &self.wrapped.is_some())
            .finish()
    }
}

impl<P, I, T> Accepted<P, I, T>
where
    P: DeserializeOwned,
    I: DeserializeOwned + Send + Sync,
{
    pub fn new(poller: Poller<P, I>, wrap: impl Fn(Arc<I>) -> T + Send + Sync + 'static) -> Self {
        Self {
            poller,
            wrap: Box::new(wrap),
            wrapped: None,
        }
    }

    /// Deserialized accepted response; returns immediately.
    pub fn activation_response(&self) -> std::result::Result<PollResponse<P>, LroError> {
        self.poller.activation_response()
    }

    pub fn status(&self) -> OperationStatus {
        self.poller.status()
    }

    pub fn poller(&self) -> &Poller<P, I> {
        &self.poller
    }

    pub async fn poll(&mut self) -> std::result::Result<PollResponse<P>, LroError> {
        self.poller.poll().await
    }

    pub async fn wait_for_completion(
        &mut self,
        timeout: Option<Duration>,
    ) -> std::result::Result<PollResponse<P>, LroError> {
        self.poller.wait_for_completion(timeout).await
    }

    pub async fn wait_until(
        &mut self,
        target: OperationStatus,
        timeout: Option<Duration>,
    ) -> std::result::Result<PollResponse<P>, LroError> {
        self.poller.wait_until(target, timeout).await
    }

    /// Final wrapped result. Computed once; later calls return the same `Arc`.
    pub async fn final_result(&mut self) -> std::result::Result<Arc<T>, LroError> {
        if let Some(done) = &self.wrapped {
            return Ok(Arc::clone(done));
        }
        let inner = self.poller.final_result().await?;
        let wrapped = Arc::new((self.wrap)(inner));
        self.wrapped = Some(Arc::clone(&wrapped));
        Ok(wrapped)
    }

    /// Blocking form of [`Accepted::final_result`] for callers outside an
    /// async runtime.
    pub fn final_result_blocking(&mut self) -> Result<Arc<T>> {
        Ok(block_on(self.final_result())??)
    }

    pub async fn cancel_operation(&mut self) -> std::result::Result<(), LroError> {
        self.poller.cancel_operation().await
    }
}
