use std::collections::HashMap;

use super::Prepared;
use crate::errors::RowRejection;
use crate::models::{LegacyRegion, RegionDraft};

/// Folds legacy regions into one draft per distinct name, in first-seen order.
pub fn prepare_regions(regions: &[LegacyRegion]) -> Prepared<RegionDraft> {
    let mut prepared: Prepared<RegionDraft> = Prepared::default();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for region in regions {
        let Some(name) = region.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            prepared.reject(RowRejection::new("region", region.id, "missing name"));
            continue;
        };

        match by_name.get(name) {
            Some(&index) => prepared.items[index].legacy_ids.push(region.id),
            None => {
                by_name.insert(name.to_string(), prepared.items.len());
                prepared.items.push(RegionDraft {
                    name: name.to_string(),
                    legacy_ids: vec![region.id],
                });
            }
        }
    }

    prepared
}
