//! Integration tests for the PostgreSQL registry store.
//!
//! These tests require a real PostgreSQL database and use SQLx test macros
//! to ensure proper test isolation and cleanup.
//!
//! Run with: `DATABASE_URL=... cargo test --test postgres_integration -- --ignored`

use sqlx::Row;
use station_registry_repository::types::{
    CellDetails, Duplex, EditStatus, GsmDetails, NewBand, NewCell, NewCellDetails, NewLocation,
    NewOperator, NewRegion, NewStation, Rat, StationStatus,
};
use station_registry_repository::{PostgresRegistryStore, RegistryStore, RegistryStoreError};

fn make_region(name: &str) -> NewRegion {
    NewRegion {
        name: name.to_string(),
    }
}

// ============================================================================
// Ordering Tests
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_insert_regions_returns_ids_in_input_order(pool: sqlx::PgPool) {
    let store = PostgresRegistryStore::new(pool.clone());
    let names = ["Mazowieckie", "Pomorskie", "Slaskie"];
    let rows: Vec<NewRegion> = names.iter().map(|n| make_region(n)).collect();

    let ids = store.insert_regions(&rows).await.unwrap();

    assert_eq!(ids.len(), 3);
    for (id, name) in ids.iter().zip(names) {
        let stored: String = sqlx::query("SELECT name FROM regions WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap()
            .get("name");
        assert_eq!(stored, name);
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_duplicate_region_fails(pool: sqlx::PgPool) {
    let store = PostgresRegistryStore::new(pool);
    let result = store
        .insert_regions(&[make_region("Mazowieckie"), make_region("Mazowieckie")])
        .await;

    assert!(matches!(result, Err(RegistryStoreError::DatabaseError(_))));
}

// ============================================================================
// Full Graph Tests
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_write_full_station_graph(pool: sqlx::PgPool) {
    let store = PostgresRegistryStore::new(pool.clone());

    let region_id = store.insert_regions(&[make_region("Mazowieckie")]).await.unwrap()[0];
    let operator_ids = store
        .insert_operators(&[
            NewOperator {
                name: "Orange".to_string(),
                mnc: "26003".to_string(),
            },
            NewOperator {
                name: "nju mobile (Orange)".to_string(),
                mnc: "26034".to_string(),
            },
        ])
        .await
        .unwrap();
    store
        .set_operator_parent(operator_ids[1], operator_ids[0])
        .await
        .unwrap();

    let location_id = store
        .insert_locations(&[NewLocation {
            legacy_id: 3,
            region_id,
            city: Some("Warszawa".to_string()),
            address: Some("Marszalkowska 1".to_string()),
            latitude: 52.2297,
            longitude: 21.0122,
        }])
        .await
        .unwrap()[0];
    let band_id = store
        .insert_bands(&[NewBand {
            key: "GSM:900:FDD".to_string(),
            standard: Rat::Gsm,
            frequency: 900,
            duplex: Some(Duplex::Fdd),
        }])
        .await
        .unwrap()[0];
    let station_id = store
        .insert_stations(&[NewStation {
            legacy_id: 7,
            operator_id: operator_ids[0],
            location_id,
            station_code: "WAR001".to_string(),
            status: StationStatus::Active,
            edit_status: EditStatus::Published,
            rats: vec![Rat::Gsm],
            notes: None,
        }])
        .await
        .unwrap()[0];
    let cell_id = store
        .insert_cells(&[NewCell {
            legacy_id: 5,
            station_id,
            band_id,
            rat: Rat::Gsm,
            lac: Some(100),
            cid: Some(5),
            azimuth: Some(120),
            notes: None,
            is_confirmed: true,
            created_at: None,
            updated_at: None,
        }])
        .await
        .unwrap()[0];
    let written = store
        .insert_cell_details(&[NewCellDetails {
            cell_id,
            details: CellDetails::Gsm(GsmDetails { bsic: Some(12) }),
        }])
        .await
        .unwrap();

    assert_eq!(written, 1);
    let operators = store.list_operators().await.unwrap();
    assert_eq!(operators[1].parent_id, Some(operator_ids[0]));

    let cell_station: i64 = sqlx::query("SELECT station_id FROM cells WHERE id = $1")
        .bind(cell_id)
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("station_id");
    assert_eq!(cell_station, station_id);

    let band_key: String = sqlx::query("SELECT key FROM bands WHERE id = $1")
        .bind(band_id)
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("key");
    assert_eq!(band_key, "GSM:900:FDD");
}
