//! Error types for the station migration.
//!
//! Parse and load problems that only affect one file or one row are reported
//! as warnings and never raise; everything else bubbles up to the executor as
//! a [`MigrationError`].
use std::path::PathBuf;

use station_registry_repository::RegistryStoreError;
use thiserror::Error;

/// Malformed statement in a dump file.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("statement {statement} (line {line}): {message}")]
pub struct ParseError {
    /// 1-based index of the statement in the file.
    pub statement: usize,
    /// 1-based line where the offending token starts.
    pub line: usize,
    pub message: String,
}

/// Errors raised while loading the legacy dump directory.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Dump directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// A legacy row that was dropped rather than migrated.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{entity} {}: {reason}", display_id(.legacy_id))]
pub struct RowRejection {
    pub entity: &'static str,
    pub legacy_id: Option<i64>,
    pub reason: String,
}

impl RowRejection {
    pub fn new(
        entity: &'static str,
        legacy_id: impl Into<Option<i64>>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            entity,
            legacy_id: legacy_id.into(),
            reason: reason.into(),
        }
    }
}

fn display_id(id: &Option<i64>) -> String {
    id.map_or_else(|| "?".to_string(), |id| id.to_string())
}

/// A failed insert batch.
#[derive(Debug, Error)]
#[error("Failed to write {entity} batch {batch}/{batches}: {source}")]
pub struct WriteError {
    pub entity: &'static str,
    /// 1-based index of the failed batch.
    pub batch: usize,
    pub batches: usize,
    #[source]
    pub source: RegistryStoreError,
}

/// Errors that abort a migration run.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("Store error: {0}")]
    Store(#[from] RegistryStoreError),
}

impl MigrationError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
