//! Reconciliation engine
//!
//! Computes which migrations are pending from the catalog and the log,
//! then applies or reverts them one at a time. A failing migration stops
//! the batch; migrations applied before it stay applied and recorded.

use crate::catalog::{Catalog, DEFAULT_MIGRATIONS_DIR};
use crate::context::MigrationContext;
use crate::error::{EngineError, EngineResult};
use crate::source::MigrationSource;
use crate::unit::{MigrationStep, MigrationUnit};
use cairn_core::{MigrationFile, MigrationKind, MigrationRecord};
use cairn_storage::{DocumentStore, MigrationLog, DEFAULT_COLLECTION};
use std::path::PathBuf;
use std::sync::Arc;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding migration files
    pub migrations_dir: PathBuf,

    /// Collection holding the migration log
    pub collection: String,

    /// Display name of the target database
    pub database: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
            collection: DEFAULT_COLLECTION.to_string(),
            database: "default".to_string(),
        }
    }
}

/// Options shared by `run` and `revert`
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Report what would happen without touching the store
    pub dry_run: bool,

    /// With a search filter, ignore the log and process every match
    pub force: bool,

    /// Substring a file name must contain
    pub filter: Option<String>,
}

impl RunOptions {
    /// The search filter, with an empty string treated as absent
    pub fn search(&self) -> Option<&str> {
        self.filter.as_deref().filter(|s| !s.is_empty())
    }

    /// Only a forced *and* named selection skips the log check
    fn bypasses_log(&self) -> bool {
        self.force && self.search().is_some()
    }
}

/// Which catalog entries `list` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListMode {
    /// Files without a log record
    #[default]
    Pending,
    /// Files with a log record
    Executed,
    /// Every file
    All,
}

/// What happened to a migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Applied,
    Reverted,
    WouldApply,
    WouldRevert,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Applied => "executed",
            Self::Reverted => "reverted",
            Self::WouldApply => "would be executed",
            Self::WouldRevert => "would be reverted",
        })
    }
}

/// One processed migration
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub file: MigrationFile,
    pub kind: MigrationKind,
    pub action: Action,
}

/// Outcome of a `run` or `revert`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub dry_run: bool,
    pub entries: Vec<ReportEntry>,
}

impl Report {
    fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, file: MigrationFile, kind: MigrationKind, action: Action) {
        self.entries.push(ReportEntry { file, kind, action });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A catalog entry joined with its log record, if any
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationStatus {
    pub file: MigrationFile,
    pub record: Option<MigrationRecord>,
}

impl MigrationStatus {
    pub fn is_executed(&self) -> bool {
        self.record.is_some()
    }
}

/// The migration reconciliation engine
///
/// Construct one per command invocation.
pub struct Engine {
    catalog: Catalog,
    log: MigrationLog,
    source: Arc<dyn MigrationSource>,
    context: MigrationContext,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn DocumentStore>,
        source: Arc<dyn MigrationSource>,
    ) -> Self {
        let log = MigrationLog::new(store.clone(), config.collection);
        let context = MigrationContext::new(store, config.database);

        Self {
            catalog: Catalog::new(config.migrations_dir),
            log,
            source,
            context,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn log(&self) -> &MigrationLog {
        &self.log
    }

    pub fn context(&self) -> &MigrationContext {
        &self.context
    }

    /// Apply pending migrations, oldest first
    pub async fn run(&self, options: &RunOptions) -> EngineResult<Report> {
        let candidates = self.candidates(options.search())?;
        let executed = self.log.list_all().await?;

        let pending: Vec<_> = if options.bypasses_log() {
            candidates
        } else {
            candidates
                .into_iter()
                .filter(|file| !is_recorded(file, &executed))
                .collect()
        };

        tracing::info!(
            "Found {} migrations to run in {}",
            pending.len(),
            self.catalog.dir().display()
        );

        let mut report = Report::new(options.dry_run);
        for file in pending {
            let unit = self.load(&file).await?;
            let kind = unit.kind();

            if options.dry_run {
                tracing::info!("Dry run: {} ({}) would be executed", file, kind);
                report.push(file, kind, Action::WouldApply);
                continue;
            }

            if is_recorded(&file, &executed) {
                tracing::warn!("Re-applying already executed migration {}", file);
            }

            self.invoke(&file, unit.forward(), report.len()).await?;
            self.log
                .upsert(&file.identifier, &MigrationRecord::new(&file, kind))
                .await?;

            tracing::info!("Migration {} ({}) executed", file, kind);
            report.push(file, kind, Action::Applied);
        }

        Ok(report)
    }

    /// Revert executed migrations in catalog order.
    ///
    /// Every target is loaded and classified before the first `down` runs,
    /// so an irreversible migration anywhere in the selection aborts the
    /// whole batch untouched, dry run or not.
    pub async fn revert(&self, options: &RunOptions) -> EngineResult<Report> {
        let candidates = self.candidates(options.search())?;
        let executed = self.log.list_all().await?;

        let targets: Vec<_> = if options.bypasses_log() {
            candidates
        } else {
            candidates
                .into_iter()
                .filter(|file| is_recorded(file, &executed))
                .collect()
        };

        tracing::info!("Found {} migrations to revert", targets.len());

        let mut downs = Vec::with_capacity(targets.len());
        for file in targets {
            match self.load(&file).await? {
                MigrationUnit::Irreversible { .. } => {
                    return Err(EngineError::IrreversibleRevert(file.file_name));
                }
                MigrationUnit::Reversible { down, .. } => downs.push((file, down)),
            }
        }

        let mut report = Report::new(options.dry_run);
        for (file, down) in downs {
            if options.dry_run {
                tracing::info!("Dry run: {} would be reverted", file);
                report.push(file, MigrationKind::Reversible, Action::WouldRevert);
                continue;
            }

            self.invoke(&file, &down, report.len()).await?;
            self.log.delete(&file.identifier).await?;

            tracing::info!("Migration {} reverted", file);
            report.push(file, MigrationKind::Reversible, Action::Reverted);
        }

        Ok(report)
    }

    /// Catalog entries filtered by execution state
    pub async fn list(&self, mode: ListMode) -> EngineResult<Vec<MigrationFile>> {
        Ok(self
            .status(mode)
            .await?
            .into_iter()
            .map(|status| status.file)
            .collect())
    }

    /// Catalog entries joined with their log record, filtered by execution
    /// state
    pub async fn status(&self, mode: ListMode) -> EngineResult<Vec<MigrationStatus>> {
        let files = self.catalog.list(None)?;
        let executed = self.log.list_all().await?;

        Ok(files
            .into_iter()
            .map(|file| {
                let record = executed
                    .iter()
                    .find(|(_, record)| file.matches_timestamp(&record.timestamp))
                    .map(|(_, record)| record.clone());
                MigrationStatus { file, record }
            })
            .filter(|status| match mode {
                ListMode::All => true,
                ListMode::Executed => status.is_executed(),
                ListMode::Pending => !status.is_executed(),
            })
            .collect())
    }

    fn candidates(&self, search: Option<&str>) -> EngineResult<Vec<MigrationFile>> {
        let files = self.catalog.list(search)?;
        match search {
            Some(search) if files.is_empty() => Err(EngineError::NotFound(search.to_string())),
            _ => Ok(files),
        }
    }

    async fn load(&self, file: &MigrationFile) -> EngineResult<MigrationUnit> {
        self.source.resolve(file, &self.catalog.path_of(file)).await
    }

    async fn invoke(
        &self,
        file: &MigrationFile,
        step: &Arc<dyn MigrationStep>,
        completed: usize,
    ) -> EngineResult<()> {
        step.apply(&self.context)
            .await
            .map_err(|source| EngineError::MigrationBody {
                file: file.file_name.clone(),
                completed,
                source: source.into(),
            })
    }
}

/// Whether any record's timestamp occurs in the file name
fn is_recorded(file: &MigrationFile, executed: &[(String, MigrationRecord)]) -> bool {
    executed
        .iter()
        .any(|(_, record)| file.matches_timestamp(&record.timestamp))
}
