// src/lro/status.rs

//! Operation status and how it is read off a response.

use std::fmt;

use serde_json::Value;

use super::response::HttpResponse;

/// Status of a long-running operation.
///
/// `InProgress` is the only non-terminal state; the other three absorb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed,
    UserCancelled,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OperationStatus::InProgress)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, OperationStatus::Failed | OperationStatus::UserCancelled)
    }

    /// Map a service-reported state string.
    ///
    /// Unknown strings ("Accepted", "Creating", "Updating", ...) are treated
    /// as still running.
    pub fn from_service_state(state: &str) -> Self {
        match state.trim().to_ascii_lowercase().as_str() {
            "succeeded" => OperationStatus::Succeeded,
            "failed" => OperationStatus::Failed,
            "canceled" | "cancelled" => OperationStatus::UserCancelled,
            _ => OperationStatus::InProgress,
        }
    }

    /// Determine the status carried by a response.
    ///
    /// A `status` or `properties.provisioningState` body field wins. Without
    /// one, the HTTP status decides: 202 is running, other 2xx succeeded,
    /// anything >= 400 failed.
    pub fn from_response(response: &HttpResponse) -> Self {
        if response.status >= 400 {
            return OperationStatus::Failed;
        }

        if let Some(state) = body_state(response) {
            return Self::from_service_state(&state);
        }

        match response.status {
            202 => OperationStatus::InProgress,
            200..=299 => OperationStatus::Succeeded,
            _ => OperationStatus::InProgress,
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationStatus::InProgress => "InProgress",
            OperationStatus::Succeeded => "Succeeded",
            OperationStatus::Failed => "Failed",
            OperationStatus::UserCancelled => "Canceled",
        };
        f.write_str(s)
    }
}

fn body_state(response: &HttpResponse) -> Option<String> {
    if !response.has_body() {
        return None;
    }
    let value: Value = serde_json::from_slice(&response.body).ok()?;
    value
        .get("status")
        .and_then(Value::as_str)
        .or_else(|| {
            value
                .get("properties")
                .and_then(|p| p.get("provisioningState"))
                .and_then(Value::as_str)
        })
        .map(str::to_string)
}
