//! Deferred results of non-blocking execution.

use std::future::Future;
use std::pin::Pin;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::runtime::Handle;

use dynamap_core::error::{DatabaseError, Error, Result};

/// A database result that becomes available later.
///
/// Combinators chain further work without blocking; [`DbFuture::wait`] is
/// the only way to block on the outcome. Dropping an unstarted future
/// cancels nothing that has already been spawned.
#[must_use = "a DbFuture does nothing unless awaited, waited on or given a callback"]
pub struct DbFuture<T> {
    inner: BoxFuture<'static, Result<T>>,
    handle: Handle,
}

impl<T: Send + 'static> DbFuture<T> {
    /// Wraps a future that will run on `handle`.
    pub(crate) fn new<F>(handle: Handle, future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            inner: future.boxed(),
            handle,
        }
    }

    /// Starts `future` on the pool immediately.
    ///
    /// A panic inside the task surfaces as `DatabaseError::TaskFailed`.
    pub(crate) fn spawn<F>(handle: Handle, future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let task = handle.spawn(future);
        Self::new(handle, async move {
            task.await
                .map_err(|e| Error::from(DatabaseError::TaskFailed(e.to_string())))?
        })
    }

    /// An already completed success.
    pub fn successful(handle: Handle, value: T) -> Self {
        Self::new(handle, async move { Ok(value) })
    }

    /// An already completed failure.
    pub fn failed(handle: Handle, error: Error) -> Self {
        Self::new(handle, async move { Err(error) })
    }

    /// Transforms the successful value.
    pub fn map<U, F>(self, f: F) -> DbFuture<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let Self { inner, handle } = self;
        DbFuture::new(handle, async move { inner.await.map(f) })
    }

    /// Chains another deferred computation on success.
    ///
    /// Failures short-circuit: `f` never runs and the error is propagated.
    pub fn and_then<U, F>(self, f: F) -> DbFuture<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> DbFuture<U> + Send + 'static,
    {
        let Self { inner, handle } = self;
        DbFuture::new(handle, async move {
            let value = inner.await?;
            f(value).await
        })
    }

    /// Turns a failure into a value.
    pub fn recover<F>(self, f: F) -> DbFuture<T>
    where
        F: FnOnce(Error) -> T + Send + 'static,
    {
        let Self { inner, handle } = self;
        DbFuture::new(handle, async move { Ok(inner.await.unwrap_or_else(f)) })
    }

    /// Runs both futures concurrently and pairs their values.
    ///
    /// Fails with the first error observed.
    pub fn zip<U: Send + 'static>(self, other: DbFuture<U>) -> DbFuture<(T, U)> {
        let Self { inner, handle } = self;
        DbFuture::new(handle, async move {
            futures_util::future::try_join(inner, other.inner).await
        })
    }

    /// Calls `f` with the value once the operation succeeds.
    ///
    /// The callback runs on a pool thread. The returned future still yields
    /// the same result.
    pub fn on_success<F>(self, f: F) -> Self
    where
        T: Clone,
        F: FnOnce(T) + Send + 'static,
    {
        self.on_complete(move |result| {
            if let Ok(value) = result {
                f(value.clone());
            }
        })
    }

    /// Calls `f` with the error once the operation fails.
    pub fn on_failure<F>(self, f: F) -> Self
    where
        F: FnOnce(Error) + Send + 'static,
    {
        self.on_complete(move |result| {
            if let Err(error) = result {
                f(error.clone());
            }
        })
    }

    /// Calls `f` with the outcome, success or failure.
    ///
    /// The operation is started immediately so the callback fires even if
    /// the returned future is dropped.
    pub fn on_complete<F>(self, f: F) -> Self
    where
        F: FnOnce(&Result<T>) + Send + 'static,
    {
        let Self { inner, handle } = self;
        Self::spawn(handle.clone(), async move {
            let result = inner.await;
            f(&result);
            result
        })
    }

    /// Blocks the calling thread until the result is ready.
    ///
    /// Fails with `Error::Timeout` if `timeout` elapses first. Must not be
    /// called from a pool thread.
    pub fn wait(self, timeout: Duration) -> Result<T> {
        let Self { inner, handle } = self;
        let (tx, rx) = mpsc::sync_channel(1);

        handle.spawn(async move {
            let _ = tx.send(inner.await);
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(Error::Timeout { after: timeout }),
            Err(RecvTimeoutError::Disconnected) => Err(DatabaseError::TaskFailed(
                "task ended without producing a result".to_string(),
            )
            .into()),
        }
    }
}

impl<T> Future for DbFuture<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> std::fmt::Debug for DbFuture<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbFuture").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::pool::WorkerPool;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn pool() -> WorkerPool {
        WorkerPool::new(2).unwrap()
    }

    fn later<T: Send + 'static>(pool: &WorkerPool, delay: Duration, value: T) -> DbFuture<T> {
        DbFuture::spawn(pool.handle().clone(), async move {
            tokio::time::sleep(delay).await;
            Ok(value)
        })
    }

    fn conflict() -> Error {
        DatabaseError::ConditionFailed("accounts".to_string()).into()
    }

    #[test]
    fn test_map_and_chain() {
        let pool = pool();

        let result = later(&pool, Duration::ZERO, 20)
            .map(|n| n + 1)
            .and_then({
                let handle = pool.handle().clone();
                move |n| DbFuture::successful(handle, n * 2)
            })
            .wait(TIMEOUT);

        assert_eq!(result, Ok(42));
    }

    #[test]
    fn test_and_then_short_circuits() {
        let pool = pool();
        let (tx, rx) = mpsc::channel();

        let result = DbFuture::<i32>::failed(pool.handle().clone(), conflict())
            .and_then(move |n| {
                let _ = tx.send(n);
                DbFuture::successful(Handle::current(), n)
            })
            .wait(TIMEOUT);

        assert_eq!(result, Err(conflict()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_recover() {
        let pool = pool();

        let result = DbFuture::failed(pool.handle().clone(), conflict())
            .recover(|_| -1)
            .wait(TIMEOUT);

        assert_eq!(result, Ok(-1));
    }

    #[test]
    fn test_zip_runs_concurrently() {
        let pool = pool();
        let delay = Duration::from_millis(200);

        let started = std::time::Instant::now();
        let result = later(&pool, delay, "a")
            .zip(later(&pool, delay, "b"))
            .wait(TIMEOUT);

        assert_eq!(result, Ok(("a", "b")));
        assert!(started.elapsed() < delay * 2);
    }

    #[test]
    fn test_zip_fails_with_either_error() {
        let pool = pool();

        let result = later(&pool, Duration::ZERO, 1)
            .zip(DbFuture::<i32>::failed(pool.handle().clone(), conflict()))
            .wait(TIMEOUT);

        assert_eq!(result, Err(conflict()));
    }

    #[test]
    fn test_wait_times_out() {
        let pool = pool();
        let timeout = Duration::from_millis(20);

        let result = later(&pool, Duration::from_secs(2), ()).wait(timeout);

        assert_eq!(result, Err(Error::Timeout { after: timeout }));
    }

    #[test]
    fn test_callbacks_fire_without_waiting() {
        let pool = pool();
        let (tx, rx) = mpsc::channel();

        let success_tx = tx.clone();
        let _ = later(&pool, Duration::from_millis(10), 7)
            .on_success(move |n| success_tx.send(format!("ok {n}")).unwrap());
        let _ = DbFuture::<i32>::failed(pool.handle().clone(), conflict())
            .on_failure(move |e| tx.send(format!("err {e}")).unwrap());

        let mut seen = vec![rx.recv_timeout(TIMEOUT).unwrap(), rx.recv_timeout(TIMEOUT).unwrap()];
        seen.sort();

        assert_eq!(seen[0], "err Condition check failed on accounts");
        assert_eq!(seen[1], "ok 7");
    }

    #[test]
    fn test_on_complete_keeps_result() {
        let pool = pool();
        let (tx, rx) = mpsc::channel();

        let result = later(&pool, Duration::ZERO, 5)
            .on_complete(move |r| tx.send(r.is_ok()).unwrap())
            .wait(TIMEOUT);

        assert_eq!(result, Ok(5));
        assert_eq!(rx.recv_timeout(TIMEOUT), Ok(true));
    }

    #[test]
    fn test_panicking_task_is_task_failure() {
        let pool = pool();

        let result = DbFuture::<()>::spawn(pool.handle().clone(), async {
            panic!("boom")
        })
        .wait(TIMEOUT);

        assert!(matches!(
            result,
            Err(Error::Database(DatabaseError::TaskFailed(_)))
        ));
    }
}
