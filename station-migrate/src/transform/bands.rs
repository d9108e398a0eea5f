//! Band synthesis. The legacy schema has no band table; every band is
//! derived from the cells that use it.
use std::collections::HashSet;

use station_registry_repository::types::{Duplex, Rat};

use crate::models::{BandDraft, BandKey, LegacyCell};

/// Classifies a legacy standard string, case-insensitively.
///
/// `5G` and `NR` are the same technology.
pub fn classify_standard(standard: &str) -> Option<Rat> {
    let normalized: String = standard
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();

    match normalized.as_str() {
        "gsm" | "2g" => Some(Rat::Gsm),
        "umts" | "3g" | "wcdma" => Some(Rat::Umts),
        "cdma" | "cdma2000" => Some(Rat::Cdma),
        "lte" | "4g" => Some(Rat::Lte),
        "nr" | "5g" | "5gnr" => Some(Rat::Nr),
        "iot" | "nbiot" | "ltem" => Some(Rat::Iot),
        _ => None,
    }
}

/// Classifies a duplex hint: `FDD`, `TDD`, or nothing.
pub fn classify_duplex(value: &str) -> Option<Duplex> {
    let lower = value.to_ascii_lowercase();
    if lower.contains("tdd") {
        Some(Duplex::Tdd)
    } else if lower.contains("fdd") {
        Some(Duplex::Fdd)
    } else {
        None
    }
}

/// First run of digits in a legacy band label, e.g. `"1800"` or `"2600 TDD"`.
fn frequency(band: &str) -> Option<i32> {
    let digits: String = band
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Derives the composite band key of a legacy cell.
///
/// An explicit duplex column wins over a duplex suffix in the band label.
pub fn band_key(cell: &LegacyCell) -> Result<BandKey, String> {
    let standard = cell.standard.as_deref().ok_or("missing standard")?;
    let rat = classify_standard(standard).ok_or_else(|| format!("unknown standard `{standard}`"))?;
    let band = cell.band.as_deref().ok_or("missing band")?;
    let frequency = frequency(band).ok_or_else(|| format!("band `{band}` has no frequency"))?;
    let duplex = cell
        .duplex
        .as_deref()
        .and_then(classify_duplex)
        .or_else(|| classify_duplex(band));

    Ok(BandKey {
        standard: rat,
        frequency,
        duplex,
    })
}

/// Scans every legacy cell and returns one band per distinct key, in the
/// order keys are first seen.
///
/// Cells without a usable key contribute nothing here; `prepare_cells`
/// reports them.
pub fn prepare_bands(cells: &[LegacyCell]) -> Vec<BandDraft> {
    let mut seen = HashSet::new();
    cells
        .iter()
        .filter_map(|cell| band_key(cell).ok())
        .filter(|key| seen.insert(*key))
        .map(|key| BandDraft { key })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(id: i64, standard: &str, band: &str, duplex: Option<&str>) -> LegacyCell {
        LegacyCell {
            id,
            base_station_id: Some(1),
            standard: Some(standard.to_string()),
            band: Some(band.to_string()),
            duplex: duplex.map(str::to_string),
            lac: None,
            cid: None,
            azimuth: None,
            bsic: None,
            rnc: None,
            psc: None,
            enbid: None,
            pci: None,
            tac: None,
            gnbid: None,
            nr_type: None,
            notes: None,
            is_confirmed: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn bands_are_deduplicated_in_first_seen_order() {
        let cells = [
            cell(1, "GSM", "900", Some("FDD")),
            cell(2, "gsm", "900", Some("fdd")),
            cell(3, "LTE", "1800", Some("FDD")),
        ];

        let bands = prepare_bands(&cells);

        assert_eq!(bands.len(), 2);
        assert_eq!(
            bands[0].key,
            BandKey {
                standard: Rat::Gsm,
                frequency: 900,
                duplex: Some(Duplex::Fdd)
            }
        );
        assert_eq!(bands[1].key.standard, Rat::Lte);
        assert_eq!(bands[1].key.frequency, 1800);
    }

    #[test]
    fn band_rows_carry_their_composite_key() {
        let cells = [cell(1, "gsm", "900", Some("fdd")), cell(2, "5G", "3600", None)];
        let bands = prepare_bands(&cells);

        let rows: Vec<_> = bands.iter().map(BandDraft::to_row).collect();

        assert_eq!(rows[0].key, "GSM:900:FDD");
        assert_eq!(rows[0].standard, Rat::Gsm);
        assert_eq!(rows[0].duplex, Some(Duplex::Fdd));
        assert_eq!(rows[1].key, "NR:3600:-");
    }

    #[test]
    fn output_order_follows_input_order() {
        let cells = [
            cell(1, "LTE", "800", None),
            cell(2, "GSM", "900", None),
            cell(3, "LTE", "800", None),
        ];

        let keys: Vec<String> = prepare_bands(&cells).iter().map(|b| b.key.to_string()).collect();

        assert_eq!(keys, vec!["LTE:800:-", "GSM:900:-"]);
    }

    #[test]
    fn standards_classify_case_insensitively() {
        assert_eq!(classify_standard("5G"), Some(Rat::Nr));
        assert_eq!(classify_standard("nr"), Some(Rat::Nr));
        assert_eq!(classify_standard("Umts"), Some(Rat::Umts));
        assert_eq!(classify_standard("NB-IoT"), Some(Rat::Iot));
        assert_eq!(classify_standard("wimax"), None);
    }

    #[test]
    fn duplex_falls_back_to_band_label() {
        let key = band_key(&cell(1, "LTE", "2600 TDD", None)).unwrap();
        assert_eq!(key.duplex, Some(Duplex::Tdd));
        assert_eq!(key.frequency, 2600);

        let key = band_key(&cell(2, "LTE", "2600", Some("unknown"))).unwrap();
        assert_eq!(key.duplex, None);
    }

    #[test]
    fn cells_without_a_frequency_produce_no_band() {
        assert!(band_key(&cell(1, "GSM", "n/a", None)).is_err());
        assert!(prepare_bands(&[cell(1, "GSM", "n/a", None)]).is_empty());
    }
}
