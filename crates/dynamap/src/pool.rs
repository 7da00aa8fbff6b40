//! Worker pool dedicated to database calls.
//!
//! The pool owns a multi-threaded Tokio runtime. Operations are spawned onto
//! it so that database latency never occupies the caller's own threads.

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::error::{Result, SetupError};

static NEXT_POOL_ID: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    /// Id of the pool owning the current thread, 0 outside any pool.
    static CURRENT_POOL: Cell<usize> = const { Cell::new(0) };
}

/// Owns the runtime and shuts it down without blocking when the last pool
/// handle goes away, which may happen on one of its own workers.
struct PoolRuntime(Option<Runtime>);

impl Drop for PoolRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

/// A shared, bounded pool of worker threads.
#[derive(Clone)]
pub struct WorkerPool {
    _runtime: Arc<PoolRuntime>,
    handle: Handle,
    size: usize,
    id: usize,
}

impl WorkerPool {
    /// Starts a pool with `size` worker threads.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(SetupError::InvalidPoolSize);
        }

        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        let runtime = Builder::new_multi_thread()
            .worker_threads(size)
            .thread_name("dynamap-worker")
            .on_thread_start(move || CURRENT_POOL.with(|pool| pool.set(id)))
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();

        tracing::debug!(workers = size, "Worker pool started");

        Ok(Self {
            _runtime: Arc::new(PoolRuntime(Some(runtime))),
            handle,
            size,
            id,
        })
    }

    /// Handle used to spawn work onto the pool.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the calling thread is one of this pool's threads.
    pub fn is_current_thread(&self) -> bool {
        CURRENT_POOL.with(|pool| pool.get() == self.id)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool").field("size", &self.size).finish()
    }
}
