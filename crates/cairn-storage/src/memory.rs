//! In-memory storage backend for testing

use crate::error::{StorageError, StorageResult};
use crate::traits::{validate_key, DocumentStore};
use async_trait::async_trait;
use cairn_core::{merge_fields, Document};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// In-memory document store
///
/// Useful for testing, dry runs against scratch data and temporary storage.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of documents across all collections
    pub fn len(&self) -> usize {
        self.collections
            .read()
            .map(|c| c.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Database(format!("Lock error: {}", e))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        Ok(true)
    }

    async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Document>> {
        validate_key(collection, id)?;
        let collections = self.collections.read().map_err(lock_error)?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn put(&self, collection: &str, id: &str, document: &Document) -> StorageResult<()> {
        validate_key(collection, id)?;
        let mut collections = self.collections.write().map_err(lock_error)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document.clone());
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, fields: &Document) -> StorageResult<()> {
        validate_key(collection, id)?;
        let mut collections = self.collections.write().map_err(lock_error)?;
        let document = collections
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_default();
        merge_fields(document, fields);
        Ok(())
    }

    async fn remove(&self, collection: &str, id: &str) -> StorageResult<()> {
        validate_key(collection, id)?;
        let mut collections = self.collections.write().map_err(lock_error)?;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> StorageResult<Vec<(String, Document)>> {
        let collections = self.collections.read().map_err(lock_error)?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
