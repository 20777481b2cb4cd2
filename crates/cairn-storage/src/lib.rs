//! Cairn Storage - Document store backends and the migration log
//!
//! Migrations act on a document store, and the log of executed migrations
//! lives in a collection of that same store.

#![allow(clippy::result_large_err)]

pub mod error;
pub mod log;
pub mod traits;

#[cfg(feature = "redb")]
pub mod redb;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub mod memory;

pub use error::{StorageError, StorageResult};
pub use log::{MigrationLog, DEFAULT_COLLECTION};
pub use traits::DocumentStore;

#[cfg(feature = "redb")]
pub use redb::RedbStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

pub use memory::MemoryStore;
