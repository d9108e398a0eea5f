//! Station Migrate Main Entry Point
//!
//! Usage: `station-migrate [DUMP_DIR] [BATCH_SIZE]`, or set `LEGACY_DUMP_DIR`
//! and `MIGRATION_BATCH_SIZE`. See [`MigrationConfig`] for every setting.

use anyhow::{Context, Result};
use dotenv::dotenv;
use station_migrate::connection::open_store;
use station_migrate::progress::LogProgress;
use station_migrate::{MigrationConfig, MigrationExecutor};
use std::env;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("station_migrate=info"));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    init_tracing();

    info!(
        service_version = env!("CARGO_PKG_VERSION"),
        "Starting legacy station migration"
    );

    let config = MigrationConfig::from_env().context("Invalid configuration")?;
    let cleaner = config
        .notes_cleaner()
        .await
        .context("Failed to build notes cleaner")?;
    let store = open_store(&config)
        .await
        .context("Failed to open target store")?;

    let executor = MigrationExecutor::new(store, config, cleaner);
    let mut progress = LogProgress::new();
    let summary = executor
        .execute(&mut progress)
        .await
        .context("Migration failed")?;

    info!(
        rejected = summary.rejected,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "Done"
    );
    Ok(())
}
