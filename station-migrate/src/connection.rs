// Target store setup
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use station_registry_repository::{
    InMemoryRegistryStore, PostgresRegistryStore, RegistryStore, RegistryStoreError,
};
use tracing::info;

use crate::config::{MigrationConfig, PG_MAX_CONNECTIONS};
use crate::errors::MigrationError;

/// Connect to PostgreSQL and wrap the pool in a registry store
pub async fn connect(database_url: &str) -> Result<PostgresRegistryStore, MigrationError> {
    let pool = PgPoolOptions::new()
        .max_connections(PG_MAX_CONNECTIONS)
        .connect(database_url)
        .await
        .map_err(RegistryStoreError::from)?;

    Ok(PostgresRegistryStore::new(pool))
}

/// Opens the store the run writes to: in-memory for dry runs, PostgreSQL otherwise
pub async fn open_store(
    config: &MigrationConfig,
) -> Result<Arc<dyn RegistryStore>, MigrationError> {
    if config.dry_run {
        info!("Dry run, writing to an in-memory store");
        return Ok(Arc::new(InMemoryRegistryStore::new()));
    }

    info!("Connecting to PostgreSQL...");
    let store = connect(config.require_database_url()?).await?;
    info!("Connected to PostgreSQL");
    Ok(Arc::new(store))
}
