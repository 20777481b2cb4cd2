//! Migration log stored as a collection of the target document store
//!
//! One document per executed migration, keyed by the migration identifier
//! (the file name stem).

use crate::error::{StorageError, StorageResult};
use crate::traits::DocumentStore;
use cairn_core::{compare_timestamps, Document, MigrationRecord};
use serde_json::Value;
use std::sync::Arc;

/// Default collection holding migration records
pub const DEFAULT_COLLECTION: &str = "migrations";

/// Persistent log of executed migrations
#[derive(Clone)]
pub struct MigrationLog {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl MigrationLog {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Merge-write a record; fields of the stored document that the record
    /// does not carry are preserved
    pub async fn upsert(&self, id: &str, record: &MigrationRecord) -> StorageResult<()> {
        let fields = match serde_json::to_value(record)? {
            Value::Object(fields) => fields,
            other => {
                return Err(StorageError::Database(format!(
                    "migration record serialized to non-object: {}",
                    other
                )))
            }
        };

        self.store.merge(&self.collection, id, &fields).await?;
        tracing::debug!("Recorded migration {} in {}", id, self.collection);
        Ok(())
    }

    /// Remove a record; absent records are not an error
    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        self.store.remove(&self.collection, id).await?;
        tracing::debug!("Removed migration record {} from {}", id, self.collection);
        Ok(())
    }

    /// Get a single record
    pub async fn get(&self, id: &str) -> StorageResult<Option<MigrationRecord>> {
        self.store
            .get(&self.collection, id)
            .await?
            .map(|document| self.decode(id, document))
            .transpose()
    }

    /// All records, ascending by numeric timestamp
    pub async fn list_all(&self) -> StorageResult<Vec<(String, MigrationRecord)>> {
        let mut records = self
            .store
            .list(&self.collection)
            .await?
            .into_iter()
            .map(|(id, document)| {
                let record = self.decode(&id, document)?;
                Ok((id, record))
            })
            .collect::<StorageResult<Vec<_>>>()?;

        records.sort_by(|(a_id, a), (b_id, b)| {
            compare_timestamps(&a.timestamp, &b.timestamp).then_with(|| a_id.cmp(b_id))
        });

        Ok(records)
    }

    fn decode(&self, id: &str, document: Document) -> StorageResult<MigrationRecord> {
        serde_json::from_value(Value::Object(document)).map_err(|e| StorageError::CorruptDocument {
            collection: self.collection.clone(),
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}
