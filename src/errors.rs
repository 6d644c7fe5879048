// src/errors.rs

//! Crate-wide error types.

use std::sync::Arc;

use thiserror::Error;

use crate::lro::LroError;

/// A failure that may be reported from several places (the faulted node,
/// the group result, skipped dependents) without being rebuilt each time.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cycle detected in task graph involving node '{0}'")]
    CyclicGraph(String),

    #[error("Task '{key}' failed: {source}")]
    TaskFaulted {
        key: String,
        #[source]
        source: SharedError,
    },

    #[error("Task '{key}' skipped because dependency '{dependency}' faulted")]
    DependencyFaulted { key: String, dependency: String },

    #[error(transparent)]
    Lro(#[from] LroError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GraphError {
    /// Whether this error comes from how the graph was put together rather
    /// than from running it.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GraphError::Configuration(_) | GraphError::CyclicGraph(_)
        )
    }
}

/// Convert the error returned by a node's work into a shareable form.
pub fn share(err: anyhow::Error) -> SharedError {
    let boxed: Box<dyn std::error::Error + Send + Sync + 'static> = err.into();
    Arc::from(boxed)
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GraphError>;
