//! Document store trait definitions

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use cairn_core::{unset_fields, Document};

/// Trait for document store implementations
///
/// Documents are JSON objects addressed by `(collection, id)`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Initialize the storage (create tables, etc.)
    async fn initialize(&self) -> StorageResult<()>;

    /// Close the storage connection
    async fn close(&self) -> StorageResult<()>;

    /// Health check
    async fn health_check(&self) -> StorageResult<bool>;

    /// Get a document
    async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Document>>;

    /// Replace a document, creating it if absent
    async fn put(&self, collection: &str, id: &str, document: &Document) -> StorageResult<()>;

    /// Merge top-level fields into a document, creating it if absent
    async fn merge(&self, collection: &str, id: &str, fields: &Document) -> StorageResult<()>;

    /// Remove a document; absent documents are not an error
    async fn remove(&self, collection: &str, id: &str) -> StorageResult<()>;

    /// All documents of a collection, ordered by id
    async fn list(&self, collection: &str) -> StorageResult<Vec<(String, Document)>>;

    /// Remove fields from a document; absent documents are left alone
    async fn unset(&self, collection: &str, id: &str, fields: &[String]) -> StorageResult<()> {
        if let Some(mut document) = self.get(collection, id).await? {
            unset_fields(&mut document, fields);
            self.put(collection, id, &document).await?;
        }
        Ok(())
    }
}

/// Reject collection names and ids the key layout cannot represent
pub(crate) fn validate_key(collection: &str, id: &str) -> StorageResult<()> {
    if collection.is_empty() || collection.contains(':') {
        return Err(StorageError::InvalidKey(format!(
            "collection name must be non-empty and must not contain ':' (got {:?})",
            collection
        )));
    }
    if id.is_empty() {
        return Err(StorageError::InvalidKey(format!(
            "document id in {} must be non-empty",
            collection
        )));
    }
    Ok(())
}
