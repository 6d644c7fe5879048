// src/lro/error.rs

//! Errors raised by the poller.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use super::response::HttpResponse;
use super::status::OperationStatus;

/// Normalized service error extracted from a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementError {
    /// Service error code, absent when the body could not be parsed.
    pub code: Option<String>,
    pub message: String,
    /// HTTP status of the response the error was read from.
    pub http_status: u16,
    /// Terminal operation status.
    pub status: OperationStatus,
}

impl fmt::Display for ManagementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

impl ManagementError {
    /// Build an error from the last response of a failed operation.
    ///
    /// Accepts both `{"error":{"code","message"}}` and `{"code","message"}`.
    /// A body with neither yields a generic message carrying the raw status.
    pub fn from_response(response: &HttpResponse, status: OperationStatus) -> Self {
        let parsed = serde_json::from_slice::<ErrorEnvelope>(&response.body)
            .map(|e| e.error)
            .or_else(|_| serde_json::from_slice::<ErrorBody>(&response.body))
            .ok()
            .filter(|b| b.code.is_some() || b.message.is_some());

        match parsed {
            Some(body) => Self {
                message: body
                    .message
                    .unwrap_or_else(|| generic_message(status, response.status)),
                code: body.code,
                http_status: response.status,
                status,
            },
            None => Self {
                code: None,
                message: generic_message(status, response.status),
                http_status: response.status,
                status,
            },
        }
    }
}

fn generic_message(status: OperationStatus, http_status: u16) -> String {
    format!("Long running operation failed with status '{status}' (HTTP {http_status})")
}

/// Errors surfaced by [`super::Poller`] and [`super::Accepted`].
///
/// Cloning is cheap; the terminal failure is shared, not rebuilt.
#[derive(Error, Debug, Clone)]
pub enum LroError {
    #[error("failed to deserialize operation response: {0}")]
    Deserialization(String),

    #[error("status request failed: {0}")]
    Transport(String),

    #[error("long running operation did not succeed: {error}")]
    OperationFailed { error: Arc<ManagementError> },

    #[error("long running operation has not reached a terminal state (status {0})")]
    NotTerminal(OperationStatus),
}

impl LroError {
    /// The normalized service error, if the operation itself failed.
    pub fn management_error(&self) -> Option<&Arc<ManagementError>> {
        match self {
            LroError::OperationFailed { error } => Some(error),
            _ => None,
        }
    }
}
