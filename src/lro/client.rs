// src/lro/client.rs

//! The network side of polling, supplied by the caller.

use std::future::Future;
use std::pin::Pin;

use super::error::LroError;
use super::response::HttpResponse;

pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LroError>> + Send + 'a>>;

/// Re-issuable requests against one outstanding operation.
///
/// Implementations hide the concrete polling URL and verb. Only
/// [`OperationClient::poll_status`] is required.
pub trait OperationClient: Send + Sync {
    /// Issue one status request.
    fn poll_status(&self) -> ClientFuture<'_, HttpResponse>;

    /// Fetch the final resource after success.
    ///
    /// `None` means the last status response already carries the result.
    fn fetch_final(&self) -> Option<ClientFuture<'_, HttpResponse>> {
        None
    }

    /// Ask the service to cancel the operation. Best effort.
    fn cancel(&self) -> ClientFuture<'_, ()> {
        Box::pin(async {
            Err(LroError::Transport(
                "operation does not support cancellation".to_string(),
            ))
        })
    }
}
