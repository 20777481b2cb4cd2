//! ReDB storage backend

use crate::error::{StorageError, StorageResult};
use crate::traits::{validate_key, DocumentStore};
use async_trait::async_trait;
use cairn_core::{merge_fields, Document};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Mutex;

// Keys are `<collection>:<id>`
const DOCUMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");

/// ReDB storage backend
pub struct RedbStore {
    db: Mutex<Database>,
}

impl RedbStore {
    /// Open or create a ReDB database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path).map_err(|e| StorageError::Database(e.to_string()))?;

        // Initialize tables
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| StorageError::Database(e.to_string()))?;
            {
                let _ = write_txn.open_table(DOCUMENTS)?;
            }
            write_txn
                .commit()
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }

        Ok(Self { db: Mutex::new(db) })
    }

    fn make_key(collection: &str, id: &str) -> String {
        format!("{}:{}", collection, id)
    }

    fn decode(collection: &str, id: &str, bytes: &[u8]) -> StorageResult<Document> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::CorruptDocument {
            collection: collection.to_string(),
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl DocumentStore for RedbStore {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let read_txn = db.begin_read()?;
        let _ = read_txn.open_table(DOCUMENTS)?;
        Ok(true)
    }

    async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Document>> {
        validate_key(collection, id)?;
        let key = Self::make_key(collection, id);

        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS)?;

        if let Some(value) = table.get(key.as_str())? {
            Ok(Some(Self::decode(collection, id, value.value())?))
        } else {
            Ok(None)
        }
    }

    async fn put(&self, collection: &str, id: &str, document: &Document) -> StorageResult<()> {
        validate_key(collection, id)?;
        let key = Self::make_key(collection, id);
        let value = serde_json::to_vec(document)?;

        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(DOCUMENTS)?;
            table.insert(key.as_str(), value.as_slice())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, fields: &Document) -> StorageResult<()> {
        validate_key(collection, id)?;
        let key = Self::make_key(collection, id);

        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(DOCUMENTS)?;
            let existing = table.get(key.as_str())?.map(|v| v.value().to_vec());

            let mut document = match existing {
                Some(bytes) => Self::decode(collection, id, &bytes)?,
                None => Document::new(),
            };
            merge_fields(&mut document, fields);

            let value = serde_json::to_vec(&document)?;
            table.insert(key.as_str(), value.as_slice())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    async fn remove(&self, collection: &str, id: &str) -> StorageResult<()> {
        validate_key(collection, id)?;
        let key = Self::make_key(collection, id);

        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(DOCUMENTS)?;
            table.remove(key.as_str())?;
        }
        write_txn.commit()?;

        Ok(())
    }

    async fn list(&self, collection: &str) -> StorageResult<Vec<(String, Document)>> {
        let prefix = format!("{}:", collection);

        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS)?;

        let mut documents = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            if let Some(id) = key.value().strip_prefix(&prefix) {
                let document = Self::decode(collection, id, value.value())?;
                documents.push((id.to_string(), document));
            }
        }

        tracing::trace!("Listed {} documents from {}", documents.len(), collection);
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_redb_store() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        let store = RedbStore::open(&db_path).unwrap();
        store.initialize().await.unwrap();
        assert!(store.health_check().await.unwrap());

        // Create a document
        store
            .put("users", "ada", &doc(json!({"name": "Ada", "langs": ["en"]})))
            .await
            .unwrap();

        // Merge keeps fields not supplied
        store
            .merge("users", "ada", &doc(json!({"role": "admin"})))
            .await
            .unwrap();
        let ada = store.get("users", "ada").await.unwrap().unwrap();
        assert_eq!(ada["name"], "Ada");
        assert_eq!(ada["role"], "admin");

        // Delete the document, twice
        store.remove("users", "ada").await.unwrap();
        store.remove("users", "ada").await.unwrap();
        assert!(store.get("users", "ada").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_redb_list_is_scoped_to_collection() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        store.put("migrations", "10-b", &Document::new()).await.unwrap();
        store.put("migrations", "9-a", &Document::new()).await.unwrap();
        store.put("migrations_old", "1-x", &Document::new()).await.unwrap();

        let ids: Vec<_> = store
            .list("migrations")
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["10-b", "9-a"]);
    }

    #[tokio::test]
    async fn test_redb_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        {
            let store = RedbStore::open(&db_path).unwrap();
            store.merge("settings", "site", &doc(json!({"theme": "dark"}))).await.unwrap();
        }

        let store = RedbStore::open(&db_path).unwrap();
        let site = store.get("settings", "site").await.unwrap().unwrap();
        assert_eq!(site["theme"], "dark");
    }
}
