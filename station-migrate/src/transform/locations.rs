use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::Prepared;
use crate::errors::RowRejection;
use crate::models::{LegacyLocation, LocationDraft};

lazy_static! {
    /// `<deg><N|S|E|W><mm>'<ss>"`, e.g. `52N15'30"`.
    static ref DMS: Regex = Regex::new(r#"^(\d{1,3})([NSEW])(\d{1,2})'(\d{1,2})"$"#).unwrap();
}

/// Which coordinate a sexagesimal string is expected to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn max_degrees(&self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }

    fn hemispheres(&self) -> [char; 2] {
        match self {
            Axis::Latitude => ['N', 'S'],
            Axis::Longitude => ['E', 'W'],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("malformed coordinate `{0}`")]
    Malformed(String),

    #[error("minutes out of range in `{0}`")]
    MinutesOutOfRange(String),

    #[error("seconds out of range in `{0}`")]
    SecondsOutOfRange(String),

    #[error("hemisphere does not match axis in `{0}`")]
    WrongHemisphere(String),

    #[error("coordinate `{0}` exceeds the axis range")]
    OutOfRange(String),
}

/// Converts a legacy sexagesimal coordinate to signed decimal degrees.
///
/// Southern and western hemispheres are negative. Minutes and seconds outside
/// `[0, 59]` are rejected.
pub fn parse_dms(value: &str, axis: Axis) -> Result<f64, CoordinateError> {
    let caps = DMS
        .captures(value.trim())
        .ok_or_else(|| CoordinateError::Malformed(value.to_string()))?;

    let number = |i: usize| -> Result<u32, CoordinateError> {
        caps[i]
            .parse::<u32>()
            .map_err(|_| CoordinateError::Malformed(value.to_string()))
    };
    let degrees = number(1)?;
    let minutes = number(3)?;
    let seconds = number(4)?;
    let hemisphere = caps[2].chars().next().unwrap_or('N');

    if minutes > 59 {
        return Err(CoordinateError::MinutesOutOfRange(value.to_string()));
    }
    if seconds > 59 {
        return Err(CoordinateError::SecondsOutOfRange(value.to_string()));
    }
    if !axis.hemispheres().contains(&hemisphere) {
        return Err(CoordinateError::WrongHemisphere(value.to_string()));
    }

    let magnitude = degrees as f64 + minutes as f64 / 60.0 + seconds as f64 / 3600.0;
    if magnitude > axis.max_degrees() {
        return Err(CoordinateError::OutOfRange(value.to_string()));
    }

    Ok(match hemisphere {
        'S' | 'W' => -magnitude,
        _ => magnitude,
    })
}

pub fn prepare_locations(locations: &[LegacyLocation]) -> Prepared<LocationDraft> {
    let mut prepared = Prepared::default();

    for location in locations {
        match prepare_location(location) {
            Ok(draft) => prepared.items.push(draft),
            Err(reason) => prepared.reject(RowRejection::new("location", location.id, reason)),
        }
    }

    prepared
}

fn prepare_location(location: &LegacyLocation) -> Result<LocationDraft, String> {
    let region_id = location.region_id.ok_or("missing region")?;
    let latitude = location.latitude.as_deref().ok_or("missing latitude")?;
    let longitude = location.longitude.as_deref().ok_or("missing longitude")?;

    Ok(LocationDraft {
        legacy_id: location.id,
        legacy_region_id: region_id,
        city: location.city.clone(),
        address: location.address.clone(),
        latitude: parse_dms(latitude, Axis::Latitude).map_err(|e| e.to_string())?,
        longitude: parse_dms(longitude, Axis::Longitude).map_err(|e| e.to_string())?,
    })
}
