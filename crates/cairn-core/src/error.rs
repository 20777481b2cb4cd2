//! Error types for Cairn Core

use thiserror::Error;

/// Result type alias using Cairn's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Cairn core error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed migration file name: {0} (expected <digits>-<name>.<toml|json>)")]
    MalformedFileName(String),

    #[error("Malformed migration script: {0}")]
    MalformedScript(String),

    #[error("Unsupported migration extension: {0}")]
    UnsupportedExtension(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
