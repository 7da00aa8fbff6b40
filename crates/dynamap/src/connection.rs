//! Process-wide connection: table client, worker pool and table prefix.

use std::sync::Arc;
use std::time::Duration;

use dynamap_core::client::TableClient;

use crate::config::Config;
use crate::error::Result;
use crate::exec::{Blocking, NonBlocking};
use crate::pool::WorkerPool;
use crate::storage::{DynamoDbClient, InMemoryClient};

/// Shared handle to a table client and the pool that runs its calls.
///
/// Build one per process and clone it freely; clones share the client and
/// the pool.
#[derive(Clone)]
pub struct Connection {
    client: Arc<dyn TableClient>,
    pool: WorkerPool,
    prefix: String,
    timeout: Duration,
}

impl Connection {
    pub fn new(
        client: Arc<dyn TableClient>,
        pool: WorkerPool,
        prefix: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            pool,
            prefix: prefix.into(),
            timeout,
        }
    }

    /// Connects to DynamoDB (or the configured local endpoint).
    ///
    /// Blocks while the SDK configuration loads, so call it outside any
    /// Tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self> {
        let pool = WorkerPool::new(config.pool_size)?;
        let client = pool.handle().block_on(DynamoDbClient::from_config(config));

        tracing::info!(
            target_env = %config.target_display(),
            workers = pool.size(),
            prefix = %config.table_prefix,
            "Connection ready"
        );

        Ok(Self::new(
            Arc::new(client),
            pool,
            config.table_prefix.clone(),
            config.timeout(),
        ))
    }

    /// A connection to fresh in-memory tables.
    pub fn in_memory(config: &Config) -> Result<Self> {
        Self::with_client(config, InMemoryClient::new())
    }

    /// A connection using `client` with the pool, prefix and timeout from `config`.
    pub fn with_client(config: &Config, client: impl TableClient + 'static) -> Result<Self> {
        let pool = WorkerPool::new(config.pool_size)?;
        Ok(Self::new(
            Arc::new(client),
            pool,
            config.table_prefix.clone(),
            config.timeout(),
        ))
    }

    /// Strategy that blocks the caller until each operation completes.
    pub fn blocking(&self) -> Blocking {
        Blocking::new(self.clone())
    }

    /// Strategy that returns a [`DbFuture`](crate::exec::DbFuture) per operation.
    pub fn non_blocking(&self) -> NonBlocking {
        NonBlocking::new(self.clone())
    }

    pub fn client(&self) -> &Arc<dyn TableClient> {
        &self.client
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Default timeout for blocking calls.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("pool", &self.pool)
            .field("prefix", &self.prefix)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
