//! Executable migration units

use crate::context::MigrationContext;
use async_trait::async_trait;
use cairn_core::{DocumentOp, MigrationKind, MigrationScript};
use std::future::Future;
use std::sync::Arc;

/// One executable body: `up`, `down` or `execute`
#[async_trait]
pub trait MigrationStep: Send + Sync {
    async fn apply(&self, ctx: &MigrationContext) -> anyhow::Result<()>;
}

/// A loaded migration, classified once by its capabilities
#[derive(Clone)]
pub enum MigrationUnit {
    Reversible {
        up: Arc<dyn MigrationStep>,
        down: Arc<dyn MigrationStep>,
    },
    Irreversible {
        execute: Arc<dyn MigrationStep>,
    },
}

impl MigrationUnit {
    pub fn reversible(up: impl MigrationStep + 'static, down: impl MigrationStep + 'static) -> Self {
        Self::Reversible {
            up: Arc::new(up),
            down: Arc::new(down),
        }
    }

    pub fn irreversible(execute: impl MigrationStep + 'static) -> Self {
        Self::Irreversible {
            execute: Arc::new(execute),
        }
    }

    pub fn kind(&self) -> MigrationKind {
        match self {
            Self::Reversible { .. } => MigrationKind::Reversible,
            Self::Irreversible { .. } => MigrationKind::Irreversible,
        }
    }

    /// The forward body: `execute` or `up`
    pub fn forward(&self) -> &Arc<dyn MigrationStep> {
        match self {
            Self::Reversible { up, .. } => up,
            Self::Irreversible { execute } => execute,
        }
    }
}

impl From<MigrationScript> for MigrationUnit {
    fn from(script: MigrationScript) -> Self {
        match script {
            MigrationScript::Reversible { up, down } => {
                Self::reversible(ScriptStep::new(up), ScriptStep::new(down))
            }
            MigrationScript::Irreversible { execute } => Self::irreversible(ScriptStep::new(execute)),
        }
    }
}

impl std::fmt::Debug for MigrationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MigrationUnit").field(&self.kind()).finish()
    }
}

/// A sequence of declarative document operations
#[derive(Debug, Clone)]
pub struct ScriptStep {
    ops: Vec<DocumentOp>,
}

impl ScriptStep {
    pub fn new(ops: Vec<DocumentOp>) -> Self {
        Self { ops }
    }

    pub fn ops(&self) -> &[DocumentOp] {
        &self.ops
    }
}

#[async_trait]
impl MigrationStep for ScriptStep {
    async fn apply(&self, ctx: &MigrationContext) -> anyhow::Result<()> {
        for (index, op) in self.ops.iter().enumerate() {
            let (collection, id) = op.target();
            ctx.apply(op).await.map_err(|e| {
                anyhow::anyhow!("operation #{} on {}/{} failed: {}", index + 1, collection, id, e)
            })?;
        }
        Ok(())
    }
}

/// Adapts an async closure into a step
///
/// The closure receives its own clone of the context.
pub struct FnStep<F>(pub F);

#[async_trait]
impl<F, Fut> MigrationStep for FnStep<F>
where
    F: Fn(MigrationContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn apply(&self, ctx: &MigrationContext) -> anyhow::Result<()> {
        (self.0)(ctx.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_storage::{DocumentStore, MemoryStore};
    use serde_json::json;

    #[tokio::test]
    async fn test_script_unit_applies_ops_in_order() {
        let script = MigrationScript::from_value(json!({
            "up": [
                {"op": "set", "collection": "users", "id": "ada", "data": {"name": "Ada"}},
                {"op": "merge", "collection": "users", "id": "ada", "data": {"role": "admin"}}
            ],
            "down": [
                {"op": "delete", "collection": "users", "id": "ada"}
            ]
        }))
        .unwrap();
        let unit = MigrationUnit::from(script);
        assert_eq!(unit.kind(), MigrationKind::Reversible);

        let store = Arc::new(MemoryStore::new());
        let ctx = MigrationContext::new(store.clone(), "memory");

        unit.forward().apply(&ctx).await.unwrap();
        let ada = store.get("users", "ada").await.unwrap().unwrap();
        assert_eq!(ada["role"], "admin");

        let MigrationUnit::Reversible { down, .. } = &unit else {
            panic!("expected reversible unit");
        };
        down.apply(&ctx).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_script_step_reports_failing_op() {
        let step = ScriptStep::new(vec![DocumentOp::Delete {
            collection: "bad:name".into(),
            id: "x".into(),
        }]);
        let ctx = MigrationContext::new(Arc::new(MemoryStore::new()), "memory");

        let err = step.apply(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("operation #1 on bad:name/x"));
    }

    #[tokio::test]
    async fn test_fn_step() {
        let unit = MigrationUnit::irreversible(FnStep(|ctx: MigrationContext| async move {
            let data = json!({"ok": true}).as_object().cloned().unwrap_or_default();
            ctx.store().put("flags", "done", &data).await?;
            Ok::<(), anyhow::Error>(())
        }));
        assert_eq!(unit.kind(), MigrationKind::Irreversible);

        let store = Arc::new(MemoryStore::new());
        let ctx = MigrationContext::new(store.clone(), "memory");
        unit.forward().apply(&ctx).await.unwrap();
        assert!(store.get("flags", "done").await.unwrap().is_some());
    }
}
