// src/exec/blocking.rs

//! Synchronous façade over the async entry points.

use std::future::Future;

use crate::errors::Result;

/// Run `future` to completion on a fresh current-thread runtime.
///
/// Must not be called from inside another Tokio runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}
