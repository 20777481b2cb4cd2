//! SQLite storage backend

use crate::error::{StorageError, StorageResult};
use crate::traits::{validate_key, DocumentStore};
use async_trait::async_trait;
use cairn_core::{merge_fields, Document};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path).map_err(|e| StorageError::Database(e.to_string()))?;

        let store = Self { conn: Mutex::new(conn) };
        store.init_tables()?;

        Ok(store)
    }

    /// Create an in-memory SQLite database (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StorageError::Database(e.to_string()))?;

        let store = Self { conn: Mutex::new(conn) };
        store.init_tables()?;

        Ok(store)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let conn = self.conn.lock().map_err(|e| StorageError::Database(e.to_string()))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );
            "#,
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    fn decode(collection: &str, id: &str, data: &str) -> StorageResult<Document> {
        serde_json::from_str(data).map_err(|e| StorageError::CorruptDocument {
            collection: collection.to_string(),
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        let conn = self.conn.lock().map_err(|e| StorageError::Database(e.to_string()))?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(true)
    }

    async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Document>> {
        validate_key(collection, id)?;
        let conn = self.conn.lock().map_err(|e| StorageError::Database(e.to_string()))?;

        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|d| Self::decode(collection, id, &d)).transpose()
    }

    async fn put(&self, collection: &str, id: &str, document: &Document) -> StorageResult<()> {
        validate_key(collection, id)?;
        let conn = self.conn.lock().map_err(|e| StorageError::Database(e.to_string()))?;
        let data = serde_json::to_string(document)?;

        conn.execute(
            "INSERT OR REPLACE INTO documents (collection, id, data) VALUES (?1, ?2, ?3)",
            params![collection, id, data],
        )?;

        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, fields: &Document) -> StorageResult<()> {
        validate_key(collection, id)?;
        let mut conn = self.conn.lock().map_err(|e| StorageError::Database(e.to_string()))?;
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;

        let mut document = match existing {
            Some(data) => Self::decode(collection, id, &data)?,
            None => Document::new(),
        };
        merge_fields(&mut document, fields);

        tx.execute(
            "INSERT OR REPLACE INTO documents (collection, id, data) VALUES (?1, ?2, ?3)",
            params![collection, id, serde_json::to_string(&document)?],
        )?;
        tx.commit()?;

        Ok(())
    }

    async fn remove(&self, collection: &str, id: &str) -> StorageResult<()> {
        validate_key(collection, id)?;
        let conn = self.conn.lock().map_err(|e| StorageError::Database(e.to_string()))?;

        conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;

        Ok(())
    }

    async fn list(&self, collection: &str) -> StorageResult<Vec<(String, Document)>> {
        let conn = self.conn.lock().map_err(|e| StorageError::Database(e.to_string()))?;

        let mut stmt = conn.prepare("SELECT id, data FROM documents WHERE collection = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, data) = row?;
            let document = Self::decode(collection, &id, &data)?;
            documents.push((id, document));
        }

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_store() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.health_check().await.unwrap());

        store.put("users", "ada", &doc(json!({"name": "Ada"}))).await.unwrap();
        store.merge("users", "ada", &doc(json!({"role": "admin"}))).await.unwrap();
        store.merge("users", "bob", &doc(json!({"role": "viewer"}))).await.unwrap();

        let ada = store.get("users", "ada").await.unwrap().unwrap();
        assert_eq!(serde_json::Value::Object(ada), json!({"name": "Ada", "role": "admin"}));

        let ids: Vec<_> = store.list("users").await.unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["ada", "bob"]);

        store.remove("users", "ada").await.unwrap();
        store.remove("users", "ada").await.unwrap();
        assert!(store.get("users", "ada").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cairn.sqlite");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.put("migrations", "1-a", &doc(json!({"timestamp": "1"}))).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.list("migrations").await.unwrap().len(), 1);
    }
}
