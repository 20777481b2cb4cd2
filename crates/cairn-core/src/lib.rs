//! Cairn Core - Data model for migration lifecycle management
//!
//! This crate provides the types shared by the storage backends, the
//! reconciliation engine and the CLI: migration file names, execution
//! records and the declarative migration script format.

pub mod document;
pub mod error;
pub mod file;
pub mod record;
pub mod script;

pub use document::{merge_fields, unset_fields, Document};
pub use error::{Error, Result};
pub use file::{compare_timestamps, MigrationFile, MIGRATION_EXTENSIONS};
pub use record::{MigrationKind, MigrationRecord};
pub use script::{DocumentOp, MigrationScript, ScriptFormat};
