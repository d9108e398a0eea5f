use station_registry_repository::types::{EditStatus, Rat, StationStatus};

use super::{NotesCleaner, Prepared};
use crate::errors::RowRejection;
use crate::models::{LegacyBaseStation, StationDraft};

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Maps a legacy status string to a station status. Unrecognized values
/// become [`StationStatus::Unknown`].
pub fn classify_status(status: Option<&str>) -> StationStatus {
    let Some(status) = status else {
        return StationStatus::Unknown;
    };
    match normalize(status).as_str() {
        "active" | "on" | "online" | "working" | "1" => StationStatus::Active,
        "inactive" | "off" | "offline" | "disabled" | "0" => StationStatus::Inactive,
        "planned" | "planning" | "project" => StationStatus::Planned,
        "dismantled" | "removed" | "deleted" => StationStatus::Dismantled,
        _ => StationStatus::Unknown,
    }
}

/// Maps a legacy moderation state. Absent means the record was published;
/// an unrecognized value is an error.
pub fn classify_edit_status(edit_status: Option<&str>) -> Result<EditStatus, String> {
    let Some(edit_status) = edit_status else {
        return Ok(EditStatus::Published);
    };
    match normalize(edit_status).as_str() {
        "published" | "accepted" | "approved" | "ok" => Ok(EditStatus::Published),
        "pending" | "new" | "waiting" => Ok(EditStatus::Pending),
        "rejected" | "declined" => Ok(EditStatus::Rejected),
        other => Err(format!("unknown edit status `{other}`")),
    }
}

/// RATs flagged on a legacy station, in canonical order.
pub fn station_rats(station: &LegacyBaseStation) -> Vec<Rat> {
    let flags = [
        (station.gsm, Rat::Gsm),
        (station.umts, Rat::Umts),
        (station.cdma, Rat::Cdma),
        (station.lte, Rat::Lte),
        (station.nr, Rat::Nr),
        (station.iot, Rat::Iot),
    ];
    flags
        .into_iter()
        .filter_map(|(on, rat)| on.then_some(rat))
        .collect()
}

pub fn prepare_stations(
    stations: &[LegacyBaseStation],
    cleaner: &NotesCleaner,
) -> Prepared<StationDraft> {
    let mut prepared = Prepared::default();

    for station in stations {
        match prepare_station(station, cleaner) {
            Ok(draft) => prepared.items.push(draft),
            Err(reason) => {
                prepared.reject(RowRejection::new("base station", station.id, reason))
            }
        }
    }

    prepared
}

fn prepare_station(
    station: &LegacyBaseStation,
    cleaner: &NotesCleaner,
) -> Result<StationDraft, String> {
    let network_id = station.network_id.ok_or("missing network")?;
    let location_id = station.location_id.ok_or("missing location")?;
    let station_code = station
        .station_code
        .clone()
        .ok_or("missing station code")?;

    Ok(StationDraft {
        legacy_id: station.id,
        legacy_network_id: network_id,
        legacy_location_id: location_id,
        station_code,
        status: classify_status(station.status.as_deref()),
        edit_status: classify_edit_status(station.edit_status.as_deref())?,
        rats: station_rats(station),
        notes: station.notes.as_deref().and_then(|n| cleaner.clean(n)),
    })
}
