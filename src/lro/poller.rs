// src/lro/poller.rs

//! Polling state machine for one long-running operation.
//!
//! ```text
//! IN_PROGRESS ──poll──▶ IN_PROGRESS
//!      │
//!      └──────poll──▶ SUCCEEDED | FAILED | USER_CANCELLED   (absorbing)
//! ```
//!
//! Each `poll()` waits out the current interval (server `Retry-After` or the
//! configured default), issues one status request and records the result.
//! Once a terminal state is reached no further requests are made: status
//! reads come from the last recorded response, and the final result (or the
//! failure) is computed once and cached.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::client::OperationClient;
use super::error::{LroError, ManagementError};
use super::response::HttpResponse;
use super::serializer::{JsonSerializer, SerializerAdapter, deserialize};
use super::status::OperationStatus;
use crate::config::PollerConfig;

/// Interval between status requests when the service gives no `Retry-After`.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// State observed by one activation or status response.
#[derive(Debug)]
pub struct PollResponse<P> {
    pub status: OperationStatus,
    /// Body deserialized into the intermediate type. `None` for empty bodies
    /// and for failed operations (whose body is an error payload).
    pub value: Option<Arc<P>>,
    /// Delay the poller will honour before the next status request.
    pub retry_after: Duration,
}

impl<P> Clone for PollResponse<P> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            value: self.value.clone(),
            retry_after: self.retry_after,
        }
    }
}

pub struct Poller<P, R> {
    client: Arc<dyn OperationClient>,
    serializer: Arc<dyn SerializerAdapter>,
    default_interval: Duration,
    activation: HttpResponse,
    status: OperationStatus,
    last_response: HttpResponse,
    last_response_at: Instant,
    status_requests: u32,
    final_outcome: Option<Result<Arc<R>, LroError>>,
    _poll_type: PhantomData<fn() -> P>,
}

impl<P, R> std::fmt::Debug for Poller<P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("status", &self.status)
            .field("status_requests", &self.status_requests)
            .field("default_interval", &self.default_interval)
            .finish_non_exhaustive()
    }
}

impl<P, R> Poller<P, R>
where
    P: DeserializeOwned,
    R: DeserializeOwned + Send + Sync,
{
    /// Start tracking an operation from its accepted response.
    pub fn new(activation: HttpResponse, client: Arc<dyn OperationClient>) -> Self {
        let status = OperationStatus::from_response(&activation);
        debug!(
            http_status = activation.status,
            %status,
            retry_after = ?activation.retry_after(),
            "tracking long running operation"
        );
        Self {
            client,
            serializer: Arc::new(JsonSerializer),
            default_interval: DEFAULT_POLL_INTERVAL,
            last_response: activation.clone(),
            activation,
            status,
            last_response_at: Instant::now(),
            status_requests: 0,
            final_outcome: None,
            _poll_type: PhantomData,
        }
    }

    pub fn from_config(
        activation: HttpResponse,
        client: Arc<dyn OperationClient>,
        config: &PollerConfig,
    ) -> Self {
        Self::new(activation, client).with_default_interval(config.default_interval())
    }

    pub fn with_default_interval(mut self, interval: Duration) -> Self {
        self.default_interval = interval;
        self
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn SerializerAdapter>) -> Self {
        self.serializer = serializer;
        self
    }

    /// Last known status. Never issues a request.
    pub fn status(&self) -> OperationStatus {
        self.status
    }

    /// Number of status requests issued so far.
    pub fn status_requests(&self) -> u32 {
        self.status_requests
    }

    /// The accepted response, deserialized into the intermediate type.
    pub fn activation_response(&self) -> Result<PollResponse<P>, LroError> {
        let status = OperationStatus::from_response(&self.activation);
        Ok(PollResponse {
            status,
            value: self.poll_value(&self.activation, status)?,
            retry_after: self
                .activation
                .retry_after()
                .unwrap_or(self.default_interval),
        })
    }

    /// Last recorded state, without issuing a request.
    pub fn current(&self) -> Result<PollResponse<P>, LroError> {
        Ok(PollResponse {
            status: self.status,
            value: self.poll_value(&self.last_response, self.status)?,
            retry_after: self.next_delay(),
        })
    }

    /// Advance the state machine by one status request.
    ///
    /// A terminal poller returns its recorded state immediately.
    pub async fn poll(&mut self) -> Result<PollResponse<P>, LroError> {
        if self.status.is_terminal() {
            debug!(status = %self.status, "operation already terminal; not polling");
            return self.current();
        }

        let due = self.last_response_at + self.next_delay();
        tokio::time::sleep_until(due).await;

        let client = Arc::clone(&self.client);
        let result = client.poll_status().await;
        self.last_response_at = Instant::now();
        self.status_requests += 1;

        let response = result.inspect_err(|err| {
            warn!(error = %err, "status request failed");
        })?;

        let status = OperationStatus::from_response(&response);
        debug!(
            http_status = response.status,
            %status,
            request = self.status_requests,
            "polled operation status"
        );
        if status.is_terminal() {
            info!(%status, requests = self.status_requests, "operation reached terminal state");
        }

        self.status = status;
        self.last_response = response;
        self.current()
    }

    /// Poll until a terminal state or until `timeout` elapses.
    ///
    /// On timeout the last known (non-terminal) state is returned; the
    /// operation keeps running server-side.
    pub async fn wait_for_completion(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<PollResponse<P>, LroError> {
        self.wait_while(|status| !status.is_terminal(), timeout)
            .await
    }

    /// Poll until `target` is observed, a terminal state is reached, or
    /// `timeout` elapses.
    pub async fn wait_until(
        &mut self,
        target: OperationStatus,
        timeout: Option<Duration>,
    ) -> Result<PollResponse<P>, LroError> {
        self.wait_while(|status| status != target && !status.is_terminal(), timeout)
            .await
    }

    async fn wait_while(
        &mut self,
        keep_polling: impl Fn(OperationStatus) -> bool,
        timeout: Option<Duration>,
    ) -> Result<PollResponse<P>, LroError> {
        let deadline = timeout.map(|t| Instant::now() + t);

        while keep_polling(self.status) {
            match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, self.poll()).await {
                    Ok(polled) => {
                        polled?;
                    }
                    Err(_) => {
                        info!(status = %self.status, "wait timed out; returning last known state");
                        break;
                    }
                },
                None => {
                    self.poll().await?;
                }
            }
        }

        self.current()
    }

    /// The typed final result, waiting for completion if needed.
    ///
    /// A failed or cancelled operation yields [`LroError::OperationFailed`].
    /// Whatever the first call settles on, including a failed final read, is
    /// returned on every later call without further requests.
    pub async fn final_result(&mut self) -> Result<Arc<R>, LroError> {
        if let Some(outcome) = &self.final_outcome {
            return outcome.clone();
        }

        if !self.status.is_terminal() {
            self.wait_for_completion(None).await?;
        }

        let outcome = match self.status {
            OperationStatus::Succeeded => {
                let client = Arc::clone(&self.client);
                let response = match client.fetch_final() {
                    Some(fetch) => fetch.await,
                    None => Ok(self.last_response.clone()),
                };
                response
                    .and_then(|response| self.deserialize_body::<R>(&response))
                    .map(Arc::new)
                    .inspect_err(|err| warn!(error = %err, "could not read final result"))
            }
            OperationStatus::Failed | OperationStatus::UserCancelled => {
                let error = ManagementError::from_response(&self.last_response, self.status);
                warn!(code = ?error.code, message = %error.message, "operation failed");
                Err(LroError::OperationFailed {
                    error: Arc::new(error),
                })
            }
            OperationStatus::InProgress => return Err(LroError::NotTerminal(self.status)),
        };

        self.final_outcome = Some(outcome.clone());
        outcome
    }

    /// Request cancellation. The service may still complete the operation;
    /// the recorded status only changes through a later `poll()`.
    pub async fn cancel_operation(&mut self) -> Result<(), LroError> {
        if self.status.is_terminal() {
            debug!(status = %self.status, "operation already terminal; nothing to cancel");
            return Ok(());
        }
        info!("requesting cancellation of long running operation");
        let client = Arc::clone(&self.client);
        client.cancel().await
    }

    fn next_delay(&self) -> Duration {
        self.last_response
            .retry_after()
            .unwrap_or(self.default_interval)
    }

    fn poll_value(
        &self,
        response: &HttpResponse,
        status: OperationStatus,
    ) -> Result<Option<Arc<P>>, LroError> {
        if status.is_failure() || !response.has_body() {
            return Ok(None);
        }
        self.deserialize_body::<P>(response).map(|v| Some(Arc::new(v)))
    }

    fn deserialize_body<T: DeserializeOwned>(&self, response: &HttpResponse) -> Result<T, LroError> {
        if response.has_body() {
            deserialize(self.serializer.as_ref(), &response.body)
        } else {
            serde_json::from_value(Value::Null).map_err(|e| LroError::Deserialization(e.to_string()))
        }
    }
}
