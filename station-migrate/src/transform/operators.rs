use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::Prepared;
use crate::errors::RowRejection;
use crate::models::{LegacyNetwork, OperatorDraft};

lazy_static! {
    /// `"<child> (<parent>)"`, the legacy way of naming a sub-brand.
    static ref FAMILY_NAME: Regex = Regex::new(r"^(.+?)\s*\(([^()]+)\)\s*$").unwrap();
}

/// Name of the parent operator encoded in a legacy network name, if any.
fn parent_name(name: &str) -> Option<&str> {
    FAMILY_NAME
        .captures(name)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().trim())
}

/// Folds legacy networks into one operator per MNC and resolves each
/// operator's parent by name.
///
/// The legacy schema has no parent column; sub-brands are named
/// `"<child> (<parent>)"`. The parent is matched case-insensitively against
/// the other operators' names and recorded by MNC, because neither side has
/// a store id yet.
pub fn prepare_operators(networks: &[LegacyNetwork]) -> Prepared<OperatorDraft> {
    let mut prepared: Prepared<OperatorDraft> = Prepared::default();
    let mut by_mnc: HashMap<String, usize> = HashMap::new();

    for network in networks {
        let Some(name) = network.name.as_deref().filter(|n| !n.is_empty()) else {
            prepared.reject(RowRejection::new("network", network.id, "missing name"));
            continue;
        };
        let Some(mnc) = network.mnc.as_deref().filter(|m| !m.is_empty()) else {
            prepared.reject(RowRejection::new("network", network.id, "missing MNC"));
            continue;
        };

        match by_mnc.get(mnc) {
            Some(&index) => prepared.items[index].legacy_ids.push(network.id),
            None => {
                by_mnc.insert(mnc.to_string(), prepared.items.len());
                prepared.items.push(OperatorDraft {
                    name: name.to_string(),
                    mnc: mnc.to_string(),
                    parent_mnc: None,
                    legacy_ids: vec![network.id],
                });
            }
        }
    }

    let mnc_by_name: HashMap<String, String> = prepared
        .items
        .iter()
        .map(|op| (op.name.to_lowercase(), op.mnc.clone()))
        .collect();

    for operator in &mut prepared.items {
        let Some(parent) = parent_name(&operator.name) else {
            continue;
        };
        match mnc_by_name.get(&parent.to_lowercase()) {
            Some(parent_mnc) if *parent_mnc != operator.mnc => {
                operator.parent_mnc = Some(parent_mnc.clone());
            }
            _ => debug!(operator = %operator.name, parent, "Parent operator not found"),
        }
    }

    prepared
}
