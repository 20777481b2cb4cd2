//! Execution records persisted in the migration log

use crate::file::MigrationFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Capability classification of a migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationKind {
    /// Has `up` and `down`
    Reversible,
    /// Has only `execute`
    Irreversible,
}

impl MigrationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reversible => "reversible",
            Self::Irreversible => "irreversible",
        }
    }
}

impl std::fmt::Display for MigrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record of a migration that has been executed
///
/// Stored as a document keyed by the migration identifier. Field names on
/// disk are `timestamp`, `name`, `type` and `executedAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Leading digit run of the file name
    pub timestamp: String,

    /// Display name of the migration
    #[serde(default)]
    pub name: String,

    /// Reversibility at the time of execution
    #[serde(rename = "type")]
    pub kind: MigrationKind,

    /// When the migration body completed
    #[serde(rename = "executedAt")]
    pub executed_at: DateTime<Utc>,
}

impl MigrationRecord {
    /// Create a record for a file executed now
    pub fn new(file: &MigrationFile, kind: MigrationKind) -> Self {
        Self {
            timestamp: file.timestamp.clone(),
            name: file.name.clone(),
            kind,
            executed_at: Utc::now(),
        }
    }
}
