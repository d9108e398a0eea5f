//! # Station Migrate
//!
//! One-shot migration of the legacy cellular station database, exported as
//! per-table SQL dump files, into the normalized station registry.
//!
//! ## Architecture
//!
//! 1. **Dump**: parses `INSERT` statements and loads typed legacy rows
//! 2. **Transform**: pure functions turning legacy rows into canonical drafts
//! 3. **Writer**: persists drafts in dependency order and builds id-maps
//! 4. **Migration**: the executor that sequences the phases and reports progress
//!
//! ## Modules
//!
//! - [`config`]: Environment configuration and defaults
//! - [`dump`]: Dump parser and legacy loader
//! - [`models`]: Legacy rows, value kinds and canonical drafts
//! - [`transform`]: Entity transformers
//! - [`writer`]: Dependency-ordered batched writer
//! - [`progress`]: Progress reporting
//! - [`migration`]: Migration executor
//! - [`errors`]: Error types

pub mod config;
pub mod connection;
pub mod dump;
pub mod errors;
pub mod migration;
pub mod models;
pub mod progress;
pub mod transform;
pub mod writer;

pub use config::MigrationConfig;
pub use errors::MigrationError;
pub use migration::{MigrationExecutor, MigrationPhase, MigrationSummary};
