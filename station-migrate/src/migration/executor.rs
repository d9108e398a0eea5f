// Migration executor - orchestrates the migration flow
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use station_registry_repository::types::Rat;
use station_registry_repository::RegistryStore;
use tracing::{error, info, warn};

use super::MigrationPhase;
use crate::config::MigrationConfig;
use crate::dump::load_legacy_data;
use crate::errors::{MigrationError, RowRejection};
use crate::progress::ProgressReporter;
use crate::transform::{
    prepare_bands, prepare_cells, prepare_locations, prepare_operators, prepare_regions,
    prepare_stations, stations_by_id, NotesCleaner, Prepared,
};
use crate::writer::{IdMap, RegistryWriter};

/// Rows written by a successful run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationSummary {
    pub regions: usize,
    pub operators: usize,
    pub locations: usize,
    pub bands: usize,
    pub stations: usize,
    pub cells: usize,
    /// Detail rows per RAT.
    pub details: BTreeMap<Rat, u64>,
    pub parents_linked: usize,
    /// Legacy rows dropped at any stage.
    pub rejected: usize,
    pub elapsed: Duration,
}

/// Number of distinct new rows behind an id-map.
fn distinct(ids: &IdMap) -> usize {
    ids.values().collect::<HashSet<_>>().len()
}

/// Moves to the next phase and resets the progress total.
fn enter(phase: &mut MigrationPhase, progress: &mut dyn ProgressReporter, total: usize) {
    *phase = phase.next();
    progress.begin_phase(phase.label(), total.max(1));
}

/// Migration executor that coordinates the migration process
pub struct MigrationExecutor {
    store: Arc<dyn RegistryStore>,
    config: MigrationConfig,
    cleaner: NotesCleaner,
    phase: Mutex<MigrationPhase>,
}

impl MigrationExecutor {
    /// Create a new migration executor
    pub fn new(
        store: Arc<dyn RegistryStore>,
        config: MigrationConfig,
        cleaner: NotesCleaner,
    ) -> Self {
        Self {
            store,
            config,
            cleaner,
            phase: Mutex::new(MigrationPhase::Start),
        }
    }

    /// Phase the last run reached: `Done` or `Error` once `execute` returns.
    pub fn phase(&self) -> MigrationPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: MigrationPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    /// Execute the full migration.
    ///
    /// The store is closed exactly once, within the configured timeout, on
    /// both the success and the failure path.
    pub async fn execute(
        &self,
        progress: &mut dyn ProgressReporter,
    ) -> Result<MigrationSummary, MigrationError> {
        let start_time = Instant::now();
        let mut phase = MigrationPhase::Start;

        info!(
            dump_dir = %self.config.dump_dir.display(),
            batch_size = self.config.batch_size,
            "Starting migration"
        );
        let result = self.run(&mut phase, progress).await;
        self.close_store().await;

        match result {
            Ok(mut summary) => {
                self.set_phase(phase.next());
                summary.elapsed = start_time.elapsed();
                info!(
                    regions = summary.regions,
                    operators = summary.operators,
                    locations = summary.locations,
                    bands = summary.bands,
                    stations = summary.stations,
                    cells = summary.cells,
                    parents_linked = summary.parents_linked,
                    rejected = summary.rejected,
                    "Migration complete in {:.2}s",
                    summary.elapsed.as_secs_f64()
                );
                Ok(summary)
            }
            Err(e) => {
                error!(phase = %phase, error = %e, "Migration failed");
                self.set_phase(MigrationPhase::Error);
                Err(e)
            }
        }
    }

    /// Runs every phase up to the last detail sub-phase, leaving `phase` at
    /// the one that failed on error.
    async fn run(
        &self,
        phase: &mut MigrationPhase,
        progress: &mut dyn ProgressReporter,
    ) -> Result<MigrationSummary, MigrationError> {
        let data = load_legacy_data(&self.config.dump_dir).await?;
        let mut rejected: Vec<RowRejection> = Vec::new();
        log_rejections(&mut rejected, data.rejected);

        let writer = RegistryWriter::new(self.store.as_ref(), self.config.batch_size);
        let mut summary = MigrationSummary::default();

        let regions = take(&mut rejected, prepare_regions(&data.regions));
        enter(phase, progress, regions.len());
        let region_ids = writer
            .write_regions(&regions, progress, &mut rejected)
            .await?;
        summary.regions = distinct(&region_ids);

        let operators = take(&mut rejected, prepare_operators(&data.networks));
        enter(phase, progress, operators.len());
        let operator_ids = writer
            .write_operators(&operators, progress, &mut rejected)
            .await?;
        summary.operators = distinct(&operator_ids);
        summary.parents_linked = writer.update_operator_parents(&operators).await?;

        let locations = take(&mut rejected, prepare_locations(&data.locations));
        enter(phase, progress, locations.len());
        let location_ids = writer
            .write_locations(&locations, &region_ids, progress, &mut rejected)
            .await?;
        summary.locations = location_ids.len();
        drop(region_ids);

        let bands = prepare_bands(&data.cells);
        enter(phase, progress, bands.len());
        let band_ids = writer.write_bands(&bands, progress, &mut rejected).await?;
        summary.bands = band_ids.len();

        let stations = take(
            &mut rejected,
            prepare_stations(&data.base_stations, &self.cleaner),
        );
        enter(phase, progress, stations.len());
        let station_ids = writer
            .write_stations(&stations, &operator_ids, &location_ids, progress, &mut rejected)
            .await?;
        summary.stations = station_ids.len();
        drop(operator_ids);
        drop(location_ids);

        let legacy_stations = stations_by_id(&data.base_stations);
        let cells = take(
            &mut rejected,
            prepare_cells(&data.cells, &legacy_stations, &self.cleaner),
        );
        enter(phase, progress, cells.len());
        let written = writer
            .write_cells_and_details(
                &cells,
                &station_ids,
                &band_ids,
                phase,
                progress,
                &mut rejected,
            )
            .await?;
        summary.cells = written.cells;
        summary.details = written.details;

        summary.rejected = rejected.len();
        Ok(summary)
    }

    async fn close_store(&self) {
        match tokio::time::timeout(self.config.close_timeout, self.store.close()).await {
            Ok(()) => info!("Store closed"),
            Err(_) => warn!(
                timeout_secs = self.config.close_timeout.as_secs(),
                "Timed out closing store"
            ),
        }
    }
}

/// Logs a transformer's rejections and returns its drafts.
fn take<T>(rejected: &mut Vec<RowRejection>, prepared: Prepared<T>) -> Vec<T> {
    log_rejections(rejected, prepared.rejected);
    prepared.items
}

fn log_rejections(rejected: &mut Vec<RowRejection>, new: Vec<RowRejection>) {
    for rejection in &new {
        warn!(%rejection, "Rejected row");
    }
    rejected.extend(new);
}
