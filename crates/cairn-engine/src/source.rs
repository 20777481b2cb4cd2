//! Resolving migration files into executable units

use crate::error::{EngineError, EngineResult};
use crate::unit::{MigrationStep, MigrationUnit};
use async_trait::async_trait;
use cairn_core::{MigrationFile, MigrationScript, ScriptFormat};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Turns a catalog entry into a classified [`MigrationUnit`]
#[async_trait]
pub trait MigrationSource: Send + Sync {
    async fn resolve(&self, file: &MigrationFile, path: &Path) -> EngineResult<MigrationUnit>;
}

/// Loads declarative TOML/JSON migration scripts from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptSource;

impl ScriptSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MigrationSource for ScriptSource {
    async fn resolve(&self, file: &MigrationFile, path: &Path) -> EngineResult<MigrationUnit> {
        let source = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::NotFound(file.file_name.clone())
            } else {
                EngineError::io(path, e)
            }
        })?;

        let malformed = |e: cairn_core::Error| EngineError::MalformedMigration {
            file: file.file_name.clone(),
            reason: e.to_string(),
        };
        let format = ScriptFormat::from_extension(&file.extension).map_err(malformed)?;
        let script = MigrationScript::parse(&source, format).map_err(malformed)?;

        tracing::debug!("Loaded {} migration {}", script.kind(), file.file_name);
        Ok(script.into())
    }
}

/// Statically registered migrations, keyed by identifier
///
/// Lets an application link its migration bodies into the binary while
/// the files on disk only mark presence and ordering.
#[derive(Default)]
pub struct RegistrySource {
    units: RwLock<HashMap<String, MigrationUnit>>,
}

impl RegistrySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit under a migration identifier (file name stem)
    pub fn register(&self, identifier: impl Into<String>, unit: MigrationUnit) -> &Self {
        if let Ok(mut units) = self.units.write() {
            units.insert(identifier.into(), unit);
        }
        self
    }

    pub fn register_reversible(
        &self,
        identifier: impl Into<String>,
        up: impl MigrationStep + 'static,
        down: impl MigrationStep + 'static,
    ) -> &Self {
        self.register(identifier, MigrationUnit::reversible(up, down))
    }

    pub fn register_irreversible(
        &self,
        identifier: impl Into<String>,
        execute: impl MigrationStep + 'static,
    ) -> &Self {
        self.register(identifier, MigrationUnit::irreversible(execute))
    }

    pub fn len(&self) -> usize {
        self.units.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_shared(self) -> Arc<dyn MigrationSource> {
        Arc::new(self)
    }
}

#[async_trait]
impl MigrationSource for RegistrySource {
    async fn resolve(&self, file: &MigrationFile, _path: &Path) -> EngineResult<MigrationUnit> {
        let units = self
            .units
            .read()
            .map_err(|e| EngineError::MalformedMigration {
                file: file.file_name.clone(),
                reason: format!("registry lock poisoned: {}", e),
            })?;
        units
            .get(&file.identifier)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(file.file_name.clone()))
    }
}
