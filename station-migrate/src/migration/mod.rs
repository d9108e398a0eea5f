//! Migration orchestration.
pub mod executor;
pub mod phase;

pub use executor::{MigrationExecutor, MigrationSummary};
pub use phase::MigrationPhase;
