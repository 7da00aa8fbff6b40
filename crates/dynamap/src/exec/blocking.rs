use std::time::Duration;

use dynamap_core::error::{Error, Result};
use dynamap_core::ops::Operation;

use super::NonBlocking;
use crate::connection::Connection;
use crate::pool::WorkerPool;

/// Runs operations and blocks the calling thread until they finish.
///
/// Calls made from one of the connection's own pool threads fail with
/// [`Error::InvalidRequest`] instead of waiting on work that needs that thread.
#[derive(Debug, Clone)]
pub struct Blocking {
    inner: NonBlocking,
    pool: WorkerPool,
    timeout: Duration,
}

impl Blocking {
    pub fn new(connection: Connection) -> Self {
        let timeout = connection.timeout();
        let pool = connection.pool().clone();
        Self {
            inner: NonBlocking::new(connection),
            pool,
            timeout,
        }
    }

    /// Runs `op`, giving up with `Error::Timeout` after `timeout`.
    ///
    /// A timed out call keeps running in the background and its result is
    /// discarded.
    pub fn execute<O: Operation>(&self, op: O, timeout: Duration) -> Result<O::Output> {
        if self.pool.is_current_thread() {
            tracing::warn!(operation = O::NAME, "Blocking call from a worker pool thread");
            return Err(Error::InvalidRequest(format!(
                "{} cannot block on a worker pool thread",
                O::NAME
            )));
        }
        self.inner.execute(op).wait(timeout)
    }

    /// Default timeout used by [`Blocking::run`].
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Prefix applied to table names.
    pub fn prefix(&self) -> &str {
        self.inner.prefix()
    }

    /// Runs `op` with the connection's default timeout.
    pub fn run<O: Operation>(&self, op: O) -> Result<O::Output> {
        self.execute(op, self.timeout)
    }
}
