//! Migration file catalog

use crate::error::{EngineError, EngineResult};
use cairn_core::MigrationFile;
use std::path::{Path, PathBuf};

/// Default migrations directory, relative to the working directory
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Enumerates migration files in a directory
#[derive(Debug, Clone)]
pub struct Catalog {
    dir: PathBuf,
}

impl Catalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if it does not exist yet
    pub fn ensure_dir(&self) -> EngineResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| EngineError::io(&self.dir, e))
    }

    /// List migration files, ascending by timestamp.
    ///
    /// Creates the directory when absent. Entries that are not migration
    /// candidates are ignored, but a candidate that fails to parse is an
    /// error. A search string keeps only file names
    /// containing it anywhere.
    pub fn list(&self, search: Option<&str>) -> EngineResult<Vec<MigrationFile>> {
        self.ensure_dir()?;

        let entries = std::fs::read_dir(&self.dir).map_err(|e| EngineError::io(&self.dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| EngineError::io(&self.dir, e))?;
            let file_type = entry.file_type().map_err(|e| EngineError::io(entry.path(), e))?;
            if file_type.is_dir() {
                continue;
            }

            let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
                tracing::debug!("Skipping non UTF-8 entry {:?}", entry.path());
                continue;
            };

            if !MigrationFile::is_candidate_file_name(&file_name) {
                tracing::trace!("Ignoring unrelated file {}", file_name);
                continue;
            }
            let file = MigrationFile::parse(&file_name)
                .map_err(|_| EngineError::MalformedMigrationFile(file_name.clone()))?;
            files.push(file);
        }

        if let Some(search) = search {
            files.retain(|f| f.matches_search(search));
        }

        files.sort_by(MigrationFile::chronological);

        tracing::debug!(
            "Found {} migration files in {}",
            files.len(),
            self.dir.display()
        );
        Ok(files)
    }

    /// First file matching the search string
    pub fn find(&self, search: &str) -> EngineResult<MigrationFile> {
        self.list(Some(search))?
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::NotFound(search.to_string()))
    }

    /// Absolute location of a catalog entry
    pub fn path_of(&self, file: &MigrationFile) -> PathBuf {
        self.dir.join(&file.file_name)
    }
}
