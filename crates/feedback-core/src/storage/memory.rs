//! In-process table store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::{EntityStore, TableEntity};
use crate::{Error, Result};

type EntityKey = (String, String, String);

/// Table store kept in memory, with the same uniqueness rules as the table service.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entities: Arc<Mutex<HashMap<EntityKey, TableEntity>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities stored in `table`, ordered by partition and row key
    pub async fn entities(&self, table: &str) -> Vec<TableEntity> {
        let guard = self.entities.lock().await;
        let mut entities: Vec<TableEntity> = guard
            .iter()
            .filter(|((stored_table, _, _), _)| stored_table == table)
            .map(|(_, entity)| entity.clone())
            .collect();
        entities.sort_by(|a, b| {
            (a.partition_key(), a.row_key()).cmp(&(b.partition_key(), b.row_key()))
        });
        entities
    }

    pub async fn len(&self) -> usize {
        self.entities.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entities.lock().await.is_empty()
    }
}

impl EntityStore for MemoryStore {
    async fn create_entity(&self, table: &str, entity: &TableEntity) -> Result<()> {
        let key = (
            table.to_string(),
            entity.partition_key().to_string(),
            entity.row_key().to_string(),
        );
        let mut guard = self.entities.lock().await;
        if guard.contains_key(&key) {
            return Err(Error::EntityExists {
                partition_key: entity.partition_key().to_string(),
                row_key: entity.row_key().to_string(),
            });
        }
        guard.insert(key, entity.clone());
        Ok(())
    }
}
