use std::collections::HashMap;

use async_trait::async_trait;
use station_registry_repository::types::NewOperator;
use station_registry_repository::{RegistryStore, RegistryStoreError};
use tracing::{info, warn};

use super::{IdMap, InsertRows, RegistryWriter};
use crate::errors::{RowRejection, WriteError};
use crate::models::OperatorDraft;
use crate::progress::ProgressReporter;

#[async_trait]
impl InsertRows for NewOperator {
    async fn insert(
        store: &dyn RegistryStore,
        rows: &[Self],
    ) -> Result<Vec<i64>, RegistryStoreError> {
        store.insert_operators(rows).await
    }
}

impl RegistryWriter<'_> {
    /// Writes operators without parents. Every legacy network id folded into
    /// an operator maps to its new id.
    pub async fn write_operators(
        &self,
        drafts: &[OperatorDraft],
        progress: &mut dyn ProgressReporter,
        rejected: &mut Vec<RowRejection>,
    ) -> Result<IdMap, WriteError> {
        let written = self
            .insert_chunks("operator", drafts, progress, rejected, |draft| {
                Ok(NewOperator {
                    name: draft.name.clone(),
                    mnc: draft.mnc.clone(),
                })
            })
            .await?;

        Ok(written
            .into_iter()
            .flat_map(|(draft, id)| draft.legacy_ids.iter().map(move |legacy| (*legacy, id)))
            .collect())
    }

    /// Links child operators to their parents by MNC once both are written.
    ///
    /// Reads the written operators back so links resolve through the store's
    /// ids rather than legacy ids. Returns the number of links made.
    pub async fn update_operator_parents(
        &self,
        drafts: &[OperatorDraft],
    ) -> Result<usize, RegistryStoreError> {
        let by_mnc: HashMap<String, i64> = self
            .store
            .list_operators()
            .await?
            .into_iter()
            .map(|operator| (operator.mnc, operator.id))
            .collect();

        let mut linked = 0;
        for draft in drafts {
            let Some(parent_mnc) = &draft.parent_mnc else {
                continue;
            };
            match (by_mnc.get(&draft.mnc), by_mnc.get(parent_mnc)) {
                (Some(child), Some(parent)) => {
                    self.store.set_operator_parent(*child, *parent).await?;
                    linked += 1;
                }
                _ => warn!(
                    mnc = %draft.mnc,
                    parent_mnc = %parent_mnc,
                    "Operator parent not written, leaving unlinked"
                ),
            }
        }

        info!(linked, "Linked operator parents");
        Ok(linked)
    }
}

#[cfg(test)]
mod tests {
    use station_registry_repository::InMemoryRegistryStore;

    use super::*;
    use crate::progress::RecordingProgress;

    fn draft(
        name: &str,
        mnc: &str,
        parent_mnc: Option<&str>,
        legacy_ids: Vec<i64>,
    ) -> OperatorDraft {
        OperatorDraft {
            name: name.to_string(),
            mnc: mnc.to_string(),
            parent_mnc: parent_mnc.map(str::to_string),
            legacy_ids,
        }
    }

    #[tokio::test]
    async fn children_are_linked_after_both_sides_exist() {
        let store = InMemoryRegistryStore::new();
        let writer = RegistryWriter::new(&store, 1);
        let drafts = vec![
            draft("Heyah", "26034", Some("26002"), vec![2]),
            draft("T-Mobile", "26002", None, vec![1, 5]),
        ];

        let ids = writer
            .write_operators(&drafts, &mut RecordingProgress::new(), &mut Vec::new())
            .await
            .unwrap();
        let linked = writer.update_operator_parents(&drafts).await.unwrap();

        assert_eq!(linked, 1);
        assert_eq!(ids.get(&1), ids.get(&5));
        let operators = store.operators();
        let heyah = operators.iter().find(|o| o.mnc == "26034").unwrap();
        assert_eq!(heyah.parent_id, ids.get(&1).copied());
    }

    #[tokio::test]
    async fn missing_parent_is_left_unlinked() {
        let store = InMemoryRegistryStore::new();
        let writer = RegistryWriter::new(&store, 10);
        let drafts = vec![draft("Orphan", "26099", Some("26098"), vec![1])];

        writer
            .write_operators(&drafts, &mut RecordingProgress::new(), &mut Vec::new())
            .await
            .unwrap();

        assert_eq!(writer.update_operator_parents(&drafts).await.unwrap(), 0);
        assert_eq!(store.operators()[0].parent_id, None);
    }
}
