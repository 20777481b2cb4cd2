//! Engine error types

use cairn_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Boxed error returned by a migration body
pub type BodyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Engine error types
///
/// None of these are recovered inside the engine; each one aborts the
/// current command.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Migration not found: {0}")]
    NotFound(String),

    #[error("Malformed migration file name: {0}")]
    MalformedMigrationFile(String),

    #[error("Malformed migration {file}: {reason}")]
    MalformedMigration { file: String, reason: String },

    #[error("Cannot revert {0} because it is an irreversible migration")]
    IrreversibleRevert(String),

    #[error("Migration {file} failed: {source} ({completed} earlier migration(s) in this batch were kept)")]
    MigrationBody {
        file: String,
        completed: usize,
        #[source]
        source: BodyError,
    },

    #[error("Migration log error: {0}")]
    Store(#[from] StorageError),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// File name the error is about, when it concerns a single migration
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::NotFound(file)
            | Self::MalformedMigrationFile(file)
            | Self::IrreversibleRevert(file)
            | Self::MalformedMigration { file, .. }
            | Self::MigrationBody { file, .. } => Some(file.as_str()),
            Self::Store(_) | Self::Io { .. } => None,
        }
    }
}
