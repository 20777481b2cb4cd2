//! Cairn Engine - Discovers, applies and reverts migrations
//!
//! The [`Engine`] reconciles the migration files in a directory with the
//! execution log kept in the target document store. Migration bodies are
//! resolved through a [`MigrationSource`], which turns a file into a
//! [`MigrationUnit`]: either reversible (`up`/`down`) or irreversible
//! (`execute`).

pub mod catalog;
pub mod context;
pub mod engine;
pub mod error;
pub mod source;
pub mod unit;

pub use catalog::{Catalog, DEFAULT_MIGRATIONS_DIR};
pub use context::MigrationContext;
pub use engine::{Action, Engine, EngineConfig, ListMode, MigrationStatus, Report, ReportEntry, RunOptions};
pub use error::{EngineError, EngineResult};
pub use source::{MigrationSource, RegistrySource, ScriptSource};
pub use unit::{FnStep, MigrationStep, MigrationUnit, ScriptStep};
