// Configuration constants and environment helpers
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::errors::MigrationError;
use crate::transform::NotesCleaner;

// Batch processing configuration
pub const DEFAULT_BATCH_SIZE: usize = 500;

// Progress reporting interval, in items
pub const PROGRESS_REPORT_INTERVAL: usize = 5_000;

// PostgreSQL connection pool configuration
pub const PG_MAX_CONNECTIONS: u32 = 5;

// Bounded wait when closing the store
pub const DEFAULT_CLOSE_TIMEOUT_SECS: u64 = 10;

/// Settings for one migration run.
///
/// # Environment Variables
///
/// - `LEGACY_DUMP_DIR`: directory holding `<table>.sql` dumps (first CLI argument wins)
/// - `MIGRATION_BATCH_SIZE`: rows per insert batch (second CLI argument wins, default 500)
/// - `DATABASE_URL`: target PostgreSQL database
/// - `MIGRATION_DRY_RUN`: `true` writes to an in-memory store instead
/// - `NOTES_STRIP_PATTERNS_FILE`: one regex per line, replaces the default notes patterns
/// - `STORE_CLOSE_TIMEOUT_SECS`: bounded wait when closing the store (default 10)
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationConfig {
    pub dump_dir: PathBuf,
    pub batch_size: usize,
    pub database_url: Option<String>,
    pub dry_run: bool,
    pub notes_patterns_file: Option<PathBuf>,
    pub close_timeout: Duration,
}

impl MigrationConfig {
    /// Config for `dump_dir` with every other setting at its default.
    pub fn new(dump_dir: impl Into<PathBuf>) -> Self {
        Self {
            dump_dir: dump_dir.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            database_url: None,
            dry_run: false,
            notes_patterns_file: None,
            close_timeout: Duration::from_secs(DEFAULT_CLOSE_TIMEOUT_SECS),
        }
    }

    /// Reads the process arguments and environment.
    pub fn from_env() -> Result<Self, MigrationError> {
        let args: Vec<String> = env::args().skip(1).collect();
        Self::from_sources(&args, |key| env::var(key).ok())
    }

    /// Builds a config from CLI arguments and a variable lookup.
    pub fn from_sources(
        args: &[String],
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, MigrationError> {
        let dump_dir = args
            .first()
            .cloned()
            .or_else(|| var("LEGACY_DUMP_DIR"))
            .ok_or_else(|| {
                MigrationError::config(
                    "LEGACY_DUMP_DIR must be set or passed as the first argument",
                )
            })?;
        let dump_dir = PathBuf::from(dump_dir);
        if !dump_dir.is_dir() {
            return Err(MigrationError::config(format!(
                "Dump directory {} does not exist",
                dump_dir.display()
            )));
        }

        let batch_size = args
            .get(1)
            .cloned()
            .or_else(|| var("MIGRATION_BATCH_SIZE"))
            .map(|raw| parse_batch_size(&raw))
            .unwrap_or(DEFAULT_BATCH_SIZE);

        let dry_run = var("MIGRATION_DRY_RUN")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let close_timeout = var("STORE_CLOSE_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_CLOSE_TIMEOUT_SECS);

        Ok(Self {
            dump_dir,
            batch_size,
            database_url: var("DATABASE_URL"),
            dry_run,
            notes_patterns_file: var("NOTES_STRIP_PATTERNS_FILE").map(PathBuf::from),
            close_timeout: Duration::from_secs(close_timeout),
        })
    }

    /// DATABASE_URL, required unless running dry.
    pub fn require_database_url(&self) -> Result<&str, MigrationError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| MigrationError::config("DATABASE_URL must be set"))
    }

    /// Builds the notes cleaner, from the patterns file when one is set.
    pub async fn notes_cleaner(&self) -> Result<NotesCleaner, MigrationError> {
        let Some(path) = &self.notes_patterns_file else {
            return Ok(NotesCleaner::default());
        };
        load_notes_patterns(path).await
    }
}

/// Non-positive or unparsable sizes fall back to the default.
fn parse_batch_size(raw: &str) -> usize {
    match raw.trim().parse::<i64>() {
        Ok(size) if size > 0 => size as usize,
        _ => {
            warn!(value = raw, default = DEFAULT_BATCH_SIZE, "Invalid batch size, using default");
            DEFAULT_BATCH_SIZE
        }
    }
}

async fn load_notes_patterns(path: &Path) -> Result<NotesCleaner, MigrationError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        MigrationError::config(format!("Failed to read {}: {e}", path.display()))
    })?;
    let patterns: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();

    let cleaner = NotesCleaner::new(patterns.as_slice())
        .map_err(|e| MigrationError::config(format!("Invalid notes pattern: {e}")))?;
    info!(path = %path.display(), patterns = patterns.len(), "Loaded notes patterns");
    Ok(cleaner)
}
