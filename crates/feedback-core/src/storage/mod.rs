//! Partitioned table storage backends.

mod connection;
mod entity;
mod memory;
mod table;

use std::future::Future;

pub use connection::{StorageConnection, StorageCredential};
pub use entity::TableEntity;
pub use memory::MemoryStore;
pub use table::TableServiceClient;

use crate::Result;

/// Write access to a partitioned key-value table store.
pub trait EntityStore: Send + Sync + 'static {
    /// Insert a new entity into `table`.
    ///
    /// Fails with [`crate::Error::EntityExists`] when the partition/row key pair
    /// is already taken; existing entities are never overwritten.
    fn create_entity(
        &self,
        table: &str,
        entity: &TableEntity,
    ) -> impl Future<Output = Result<()>> + Send;
}
