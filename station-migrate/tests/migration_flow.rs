use std::path::Path;
use std::sync::Arc;

use station_migrate::errors::WriteError;
use station_migrate::progress::RecordingProgress;
use station_migrate::transform::NotesCleaner;
use station_migrate::{MigrationConfig, MigrationError, MigrationExecutor, MigrationPhase};
use station_registry_repository::types::{CellDetails, GsmDetails, Rat, StationStatus};
use station_registry_repository::InMemoryRegistryStore;
use tempfile::TempDir;

const REGIONS: &str = "-- MySQL dump\n\
    INSERT INTO `regions` (`id_region`, `region_name`) VALUES (1, 'Mazowieckie');\n";

const NETWORKS: &str = "INSERT INTO `networks` (`id_network`, `network_name`, `mnc_code`)\n\
    VALUES (3, 'Orange', '26003');\n";

const LOCATIONS: &str = r#"INSERT INTO `locations`
(`id_location`, `id_region`, `town`, `address`, `lat`, `lon`)
VALUES (30, 1, 'Warszawa', 'ul. Marszałkowska 1', '52N15''30"', '21E00''00"');
"#;

const BASE_STATIONS: &str = "LOCK TABLES `base_stations` WRITE;\n\
    INSERT INTO `base_stations` (`id_bts`, `id_network`, `id_location`, `stationid`, `is_gsm`,\n\
    `status`, `edit_state`, `comments`)\n\
    VALUES (100, 3, 30, 'WAR001', 1, 'active', NULL, '**roof top**');\n\
    UNLOCK TABLES;\n";

const CELLS: &str = "INSERT INTO `cells` (`id_cell`, `id_bts`, `std`, `freq`, `duplex`, `lac`,\n\
    `clid`, `azi`, `bsic`, `confirmed`, `date_added`)\n\
    VALUES (500, 100, 'GSM', '900', 'FDD', 100, 5, 120, 12, 1, '2019-03-01 10:00:00');\n";

fn write_dump(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

fn full_dump() -> TempDir {
    write_dump(&[
        ("regions.sql", REGIONS),
        ("networks.sql", NETWORKS),
        ("locations.sql", LOCATIONS),
        ("base_stations.sql", BASE_STATIONS),
        ("cells.sql", CELLS),
    ])
}

fn executor(store: &Arc<InMemoryRegistryStore>, dir: &Path) -> MigrationExecutor {
    MigrationExecutor::new(
        store.clone(),
        MigrationConfig::new(dir),
        NotesCleaner::default(),
    )
}

#[tokio::test]
async fn single_station_dump_migrates_end_to_end() {
    let dump = full_dump();
    let store = Arc::new(InMemoryRegistryStore::new());
    let mut progress = RecordingProgress::new();

    let summary = executor(&store, dump.path())
        .execute(&mut progress)
        .await
        .unwrap();

    assert_eq!(summary.regions, 1);
    assert_eq!(summary.operators, 1);
    assert_eq!(summary.locations, 1);
    assert_eq!(summary.bands, 1);
    assert_eq!(summary.stations, 1);
    assert_eq!(summary.cells, 1);
    assert_eq!(summary.rejected, 0);
    assert_eq!(summary.details.get(&Rat::Gsm), Some(&1));

    let (region_id, _) = store.regions()[0];
    let (location_id, location) = store.locations()[0].clone();
    assert_eq!(location.region_id, region_id);
    assert!((location.latitude - 52.258333).abs() < 1e-5);
    assert_eq!(location.longitude, 21.0);

    let operator = store.operators()[0].clone();
    assert_eq!(operator.name, "Orange");
    assert_eq!(operator.mnc, "26003");

    let (station_id, station) = store.stations()[0].clone();
    assert_eq!(station.operator_id, operator.id);
    assert_eq!(station.location_id, location_id);
    assert_eq!(station.status, StationStatus::Active);
    assert_eq!(station.rats, vec![Rat::Gsm]);
    assert_eq!(station.notes.as_deref(), Some("roof top"));

    let (cell_id, cell) = store.cells()[0].clone();
    assert_eq!(cell.station_id, station_id);
    assert_eq!(cell.band_id, store.bands()[0].0);
    assert_eq!(cell.lac, Some(100));
    assert_eq!(cell.cid, Some(5));
    assert!(cell.is_confirmed);
    assert!(cell.created_at.is_some());

    let details = store.cell_details();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].cell_id, cell_id);
    assert_eq!(
        details[0].details,
        CellDetails::Gsm(GsmDetails { bsic: Some(12) })
    );

    assert_eq!(progress.advances("cells:base"), vec![1]);
    assert!(store.is_closed());
}

#[tokio::test]
async fn failed_batch_propagates_and_keeps_earlier_phases() {
    let dump = full_dump();
    let store = Arc::new(InMemoryRegistryStore::new().failing_on("stations", 1));

    let result = executor(&store, dump.path())
        .execute(&mut RecordingProgress::new())
        .await;

    match result {
        Err(MigrationError::Write(WriteError {
            entity,
            batch,
            batches,
            ..
        })) => {
            assert_eq!(entity, "station");
            assert_eq!((batch, batches), (1, 1));
        }
        other => panic!("expected a station write error, got {other:?}"),
    }
    assert_eq!(store.regions().len(), 1);
    assert_eq!(store.locations().len(), 1);
    assert!(store.cells().is_empty());
    assert!(store.is_closed());
}

#[tokio::test]
async fn detail_failure_ends_the_run_in_error() {
    let dump = full_dump();
    let store = Arc::new(InMemoryRegistryStore::new().failing_on("cell_details", 1));
    let executor = executor(&store, dump.path());

    let result = executor.execute(&mut RecordingProgress::new()).await;

    match result {
        Err(MigrationError::Write(WriteError { entity, batch, .. })) => {
            assert_eq!(entity, "cells:gsm");
            assert_eq!(batch, 1);
        }
        other => panic!("expected a GSM details write error, got {other:?}"),
    }
    assert_eq!(executor.phase(), MigrationPhase::Error);
    assert_eq!(store.cells().len(), 1);
    assert!(store.cell_details().is_empty());
    assert!(store.is_closed());
}

#[tokio::test]
async fn missing_and_bad_rows_are_skipped_not_fatal() {
    let locations = r#"INSERT INTO locations (id_location, id_region, lat, lon)
VALUES (30, 1, '52N15''30"', '21E00''00"'), (31, 1, '52N60''00"', '21E00''00"');
"#;
    let dump = write_dump(&[
        ("regions.sql", REGIONS),
        ("networks.sql", NETWORKS),
        ("locations.sql", locations),
        ("base_stations.sql", BASE_STATIONS),
    ]);
    let store = Arc::new(InMemoryRegistryStore::new());

    let summary = executor(&store, dump.path())
        .execute(&mut RecordingProgress::new())
        .await
        .unwrap();

    assert_eq!(summary.locations, 1);
    assert_eq!(summary.stations, 1);
    assert_eq!(summary.bands, 0);
    assert_eq!(summary.cells, 0);
    assert_eq!(summary.rejected, 1);
}

#[tokio::test]
async fn malformed_statement_aborts_the_run() {
    let dump = write_dump(&[(
        "regions.sql",
        "INSERT INTO regions (id, name) VALUES (1, 'unterminated);",
    )]);
    let store = Arc::new(InMemoryRegistryStore::new());

    let result = executor(&store, dump.path())
        .execute(&mut RecordingProgress::new())
        .await;

    assert!(matches!(result, Err(MigrationError::Load(_))));
    assert!(store.regions().is_empty());
    assert!(store.is_closed());
}
