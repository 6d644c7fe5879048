// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] is the TOML-backed data model.
//! - [`loader`] reads a file from disk.
//! - [`validate`] turns a [`RawConfigFile`] into a checked [`ConfigFile`].
//!
//! [`EngineConfig`] and [`PollerConfig`] are also usable on their own, without
//! a file, through their `Default` impls.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, EngineConfig, PollerConfig, RawConfigFile, TaskConfig};
