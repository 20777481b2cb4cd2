//! Migration file names
//!
//! Every migration lives in a file named `<timestamp>-<name>.<ext>`, where
//! the timestamp is a run of ASCII digits (unix milliseconds when generated
//! by `cairn generate`). Parsing, ordering and record matching all depend on
//! this layout.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// File extensions recognised as migration files
pub const MIGRATION_EXTENSIONS: &[&str] = &["toml", "json"];

/// A migration file discovered in the migrations directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MigrationFile {
    /// Full file name, e.g. `1700000000000-add-users.toml`
    pub file_name: String,

    /// File name without extension; primary key of the execution record
    pub identifier: String,

    /// Leading digit run
    pub timestamp: String,

    /// Remainder after `<timestamp>-`, extension stripped
    pub name: String,

    /// Extension without the dot
    pub extension: String,
}

impl MigrationFile {
    /// Parse a file name into its identifier, timestamp and display name
    pub fn parse(file_name: &str) -> Result<Self> {
        let malformed = || {
            tracing::debug!("Malformed migration file name: {}", file_name);
            Error::MalformedFileName(file_name.to_string())
        };

        let (timestamp, rest) = file_name.split_once('-').ok_or_else(malformed)?;
        if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let (name, extension) = rest.rsplit_once('.').ok_or_else(malformed)?;
        if name.is_empty() || !MIGRATION_EXTENSIONS.contains(&extension) {
            return Err(malformed());
        }

        let identifier = &file_name[..file_name.len() - extension.len() - 1];

        Ok(Self {
            file_name: file_name.to_string(),
            identifier: identifier.to_string(),
            timestamp: timestamp.to_string(),
            name: name.to_string(),
            extension: extension.to_string(),
        })
    }

    /// Whether a directory entry is meant to be a migration: a leading
    /// digit run, a `-`, and a recognised extension.
    ///
    /// Candidates must still pass [`MigrationFile::parse`]; anything else in
    /// the migrations directory is unrelated.
    pub fn is_candidate_file_name(file_name: &str) -> bool {
        let digits = file_name.bytes().take_while(u8::is_ascii_digit).count();
        digits > 0
            && file_name[digits..].starts_with('-')
            && file_name
                .rsplit_once('.')
                .is_some_and(|(_, ext)| MIGRATION_EXTENSIONS.contains(&ext))
    }

    /// Build a file name in the on-disk layout
    pub fn compose_file_name(timestamp: impl std::fmt::Display, name: &str, extension: &str) -> String {
        format!("{}-{}.{}", timestamp, name, extension)
    }

    /// Whether a record with the given timestamp belongs to this file.
    ///
    /// Matching is substring containment against the full file name, not
    /// equality, so records survive renames of the descriptive part.
    pub fn matches_timestamp(&self, timestamp: &str) -> bool {
        !timestamp.is_empty() && self.file_name.contains(timestamp)
    }

    /// Whether the file name contains the given search string
    pub fn matches_search(&self, search: &str) -> bool {
        self.file_name.contains(search)
    }

    /// Ascending order by numeric timestamp, then by file name
    pub fn chronological(a: &Self, b: &Self) -> Ordering {
        compare_timestamps(&a.timestamp, &b.timestamp).then_with(|| a.file_name.cmp(&b.file_name))
    }
}

impl std::fmt::Display for MigrationFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name)
    }
}

/// Compare two decimal digit strings numerically without overflow.
///
/// Leading zeros are ignored; a longer significant part is larger, equal
/// lengths compare lexically. Strings that are not pure digits fall back to
/// plain lexical order after all numeric ones.
pub fn compare_timestamps(a: &str, b: &str) -> Ordering {
    let is_numeric = |s: &str| !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit());

    match (is_numeric(a), is_numeric(b)) {
        (true, true) => {
            let a = a.trim_start_matches('0');
            let b = b.trim_start_matches('0');
            a.len().cmp(&b.len()).then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}
