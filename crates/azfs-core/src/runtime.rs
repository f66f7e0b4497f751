//! Tokio runtime management for the synchronous client API

use crate::{Error, Result};
use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::Runtime;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get or create the shared Tokio runtime that drives object store calls
pub(crate) fn get_runtime() -> Result<&'static Runtime> {
    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("azfs-worker")
        .build()
        .map_err(|e| Error::Runtime(format!("Failed to create Tokio runtime: {}", e)))?;

    // A concurrent initializer may have won; its runtime is used and ours is dropped.
    let _ = RUNTIME.set(runtime);
    RUNTIME
        .get()
        .ok_or_else(|| Error::Runtime("Tokio runtime unavailable".to_string()))
}

/// Run a future to completion on the shared runtime.
///
/// Must not be called from inside an async context.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
    Ok(get_runtime()?.block_on(future))
}
