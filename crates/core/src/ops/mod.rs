//! Operation descriptors.
//!
//! Each descriptor is an immutable command carrying the mapping it needs and
//! its parameters. It is consumed by [`Operation::execute`], which performs
//! the remote calls against a [`TableClient`](crate::client::TableClient).
//! Execution strategies only depend on this trait, so new operations plug in
//! without touching them.

mod item;
mod table;

use async_trait::async_trait;

use crate::client::TableClient;
use crate::error::Result;

pub use item::{DeleteById, Read, Save, SaveMode, Scan};
pub use table::{CreateTable, DeleteTable, IsTableActive, TableExists, DEFAULT_POLL_INTERVAL};

/// A one-shot remote database command.
#[async_trait]
pub trait Operation: Send + 'static {
    /// Value produced on success.
    type Output: Send + 'static;

    /// Short name used in logs.
    const NAME: &'static str;

    /// Fully prefixed name of the table the operation touches.
    fn target_table(&self, prefix: &str) -> String;

    /// Runs the operation. `prefix` is prepended to every table name.
    async fn execute(self, client: &dyn TableClient, prefix: &str) -> Result<Self::Output>;
}
