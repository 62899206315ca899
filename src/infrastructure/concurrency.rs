/// Concurrency management for callorder.
/// Configures the global rayon pool used by the per-function passes.

use anyhow::{Context, Result};
use tracing::info;

/// Worker count: the requested number, or half of the cores (minimum 1).
pub fn worker_count(requested: Option<usize>) -> usize {
    match requested {
        Some(n) => n.max(1),
        None => std::cmp::max(1, num_cpus::get() / 2),
    }
}

/// Initialize the global rayon thread pool. Returns the worker count.
pub fn init_thread_pool(requested: Option<usize>) -> Result<usize> {
    let workers = worker_count(requested);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()
        .context("Failed to initialize rayon thread pool")?;

    info!(
        "initialized thread pool: {} workers (system has {} cores)",
        workers,
        num_cpus::get()
    );

    Ok(workers)
}
