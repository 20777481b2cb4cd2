//! Runtime input handed to every migration body

use cairn_core::DocumentOp;
use cairn_storage::{DocumentStore, StorageResult};
use std::sync::Arc;

/// Handle to the target document store
///
/// Built once per engine and shared by every migration of a command, so
/// all bodies in a batch see the same connection.
#[derive(Clone)]
pub struct MigrationContext {
    store: Arc<dyn DocumentStore>,
    database: String,
}

impl MigrationContext {
    pub fn new(store: Arc<dyn DocumentStore>, database: impl Into<String>) -> Self {
        Self {
            store,
            database: database.into(),
        }
    }

    /// The document store migrations act on
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Human-readable name of the target database
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Apply one declarative operation
    pub async fn apply(&self, op: &DocumentOp) -> StorageResult<()> {
        match op {
            DocumentOp::Set { collection, id, data } => self.store.put(collection, id, data).await,
            DocumentOp::Merge { collection, id, data } => self.store.merge(collection, id, data).await,
            DocumentOp::Delete { collection, id } => self.store.remove(collection, id).await,
            DocumentOp::Unset { collection, id, fields } => self.store.unset(collection, id, fields).await,
        }
    }
}

impl std::fmt::Debug for MigrationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationContext")
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_storage::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_apply_ops() {
        let store = Arc::new(MemoryStore::new());
        let ctx = MigrationContext::new(store.clone(), "memory");

        let data = json!({"name": "Ada", "role": "admin"}).as_object().cloned().unwrap();
        ctx.apply(&DocumentOp::Set {
            collection: "users".into(),
            id: "ada".into(),
            data,
        })
        .await
        .unwrap();
        ctx.apply(&DocumentOp::Unset {
            collection: "users".into(),
            id: "ada".into(),
            fields: vec!["role".into()],
        })
        .await
        .unwrap();

        let ada = ctx.store().get("users", "ada").await.unwrap().unwrap();
        assert_eq!(serde_json::Value::Object(ada), json!({"name": "Ada"}));

        ctx.apply(&DocumentOp::Delete {
            collection: "users".into(),
            id: "ada".into(),
        })
        .await
        .unwrap();
        assert!(store.is_empty());
        assert_eq!(ctx.database(), "memory");
    }
}
