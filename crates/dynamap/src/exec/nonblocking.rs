use std::sync::Arc;

use dynamap_core::error::Error;
use dynamap_core::ops::Operation;

use super::DbFuture;
use crate::connection::Connection;

/// Runs operations on the worker pool and hands back a [`DbFuture`].
#[derive(Debug, Clone)]
pub struct NonBlocking {
    connection: Connection,
}

impl NonBlocking {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Prefix applied to table names.
    pub fn prefix(&self) -> &str {
        self.connection.prefix()
    }

    /// Dispatches `op` and returns immediately.
    ///
    /// The call starts right away; dropping the returned future does not
    /// cancel it.
    pub fn execute<O: Operation>(&self, op: O) -> DbFuture<O::Output> {
        let client = Arc::clone(self.connection.client());
        let prefix = self.connection.prefix().to_string();
        let table = op.target_table(&prefix);

        tracing::debug!(operation = O::NAME, table = %table, "Dispatching operation");

        DbFuture::spawn(self.connection.pool().handle().clone(), async move {
            let result = op.execute(client.as_ref(), &prefix).await;
            if let Err(error) = &result {
                tracing::warn!(
                    operation = O::NAME,
                    table = %table,
                    error = %error,
                    "Operation failed"
                );
            }
            result
        })
    }

    /// A future that already holds `value`, for composing with real calls.
    pub fn successful<T: Send + 'static>(&self, value: T) -> DbFuture<T> {
        DbFuture::successful(self.connection.pool().handle().clone(), value)
    }

    /// A future that already failed with `error`.
    pub fn failed<T: Send + 'static>(&self, error: impl Into<Error>) -> DbFuture<T> {
        DbFuture::failed(self.connection.pool().handle().clone(), error.into())
    }
}
