//! In-process record store.
//!
//! Holds records in an insertion-ordered `Vec` behind a `Mutex`. Useful for
//! tests and for deployments where the working set is small enough that no
//! durable store is needed.

use crate::models::{NewVectorRecord, RecordId, VectorRecord};
use crate::storage::traits::{GroupByField, RecordFilter, RecordStore};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory, insertion-ordered record store.
///
/// Insertion order is preserved so the scan driver's stable tie-break is
/// deterministic across runs on the same input order.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: Mutex<Vec<VectorRecord>>,
}

impl InMemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<VectorRecord>> {
        // A poisoned lock means another thread panicked mid-operation; the
        // Vec itself is still structurally valid, so recover the guard.
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn matches(record: &VectorRecord, filter: &RecordFilter) -> bool {
        record.agent_name == filter.agent_name
            && record.namespace == filter.namespace
            && filter
                .source
                .as_ref()
                .is_none_or(|source| record.source.as_ref() == Some(source))
    }
}

impl RecordStore for InMemoryRecordStore {
    fn create(&self, record: NewVectorRecord) -> Result<VectorRecord> {
        if record.agent_name.is_empty() {
            return Err(Error::InvalidInput("agent name is empty".to_string()));
        }

        let record = record.into_record(RecordId::generate());
        self.lock().push(record.clone());
        Ok(record)
    }

    fn filter(&self, filter: &RecordFilter) -> Result<Vec<VectorRecord>> {
        Ok(self
            .lock()
            .iter()
            .filter(|record| Self::matches(record, filter))
            .cloned()
            .collect())
    }

    fn count(&self, filter: &RecordFilter) -> Result<u64> {
        Ok(self
            .lock()
            .iter()
            .filter(|record| Self::matches(record, filter))
            .count() as u64)
    }

    fn sum_token_count(&self, filter: &RecordFilter) -> Result<u64> {
        Ok(self
            .lock()
            .iter()
            .filter(|record| Self::matches(record, filter))
            .map(|record| u64::from(record.token_count))
            .sum())
    }

    fn grouped_count(
        &self,
        filter: &RecordFilter,
        group_by: GroupByField,
    ) -> Result<HashMap<String, u64>> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for record in self.lock().iter().filter(|r| Self::matches(r, filter)) {
            let key = match group_by {
                GroupByField::EmbeddingProvider => Some(record.embedding_provider.clone()),
                GroupByField::Source => record.source.clone(),
            };
            if let Some(key) = key {
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    fn delete(&self, filter: &RecordFilter) -> Result<u64> {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|record| !Self::matches(record, filter));
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(store: &InMemoryRecordStore) {
        for (content, namespace, source, provider, tokens) in [
            ("alpha", "default", Some("kb"), "openai", 3_u32),
            ("beta", "default", None, "openai", 5),
            ("gamma", "default", Some("docs"), "ollama", 7),
            ("delta", "other", Some("kb"), "openai", 11),
        ] {
            let mut record =
                NewVectorRecord::new("agent-a", content, vec![1.0, 0.0]).with_namespace(namespace);
            if let Some(source) = source {
                record = record.with_source(source);
            }
            store
                .create(record.with_embedding_origin(provider, "m1").with_token_count(tokens))
                .expect("create failed");
        }
    }

    #[test]
    fn test_create_assigns_id() {
        let store = InMemoryRecordStore::new();
        let record = store
            .create(NewVectorRecord::new("agent-a", "hello", vec![1.0]))
            .expect("create failed");
        assert!(!record.id.as_str().is_empty());
    }

    #[test]
    fn test_create_rejects_empty_agent() {
        let store = InMemoryRecordStore::new();
        let result = store.create(NewVectorRecord::new("", "hello", vec![1.0]));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_filter_scopes_partition() {
        let store = InMemoryRecordStore::new();
        seed(&store);

        let records = store
            .filter(&RecordFilter::new("agent-a", "default"))
            .expect("filter failed");
        assert_eq!(records.len(), 3);
        // Creation order preserved
        assert_eq!(records[0].content, "alpha");
        assert_eq!(records[2].content, "gamma");

        let records = store
            .filter(&RecordFilter::new("agent-a", "default").with_source("kb"))
            .expect("filter failed");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_aggregates() {
        let store = InMemoryRecordStore::new();
        seed(&store);
        let filter = RecordFilter::new("agent-a", "default");

        assert_eq!(store.count(&filter).expect("count failed"), 3);
        assert_eq!(
            store.sum_token_count(&filter).expect("sum failed"),
            3 + 5 + 7
        );

        let providers = store
            .grouped_count(&filter, GroupByField::EmbeddingProvider)
            .expect("grouped count failed");
        assert_eq!(providers.get("openai"), Some(&2));
        assert_eq!(providers.get("ollama"), Some(&1));

        // Sourceless records are excluded from the source grouping
        let sources = store
            .grouped_count(&filter, GroupByField::Source)
            .expect("grouped count failed");
        assert_eq!(sources.len(), 2);
        assert_eq!(sources.get("kb"), Some(&1));
        assert_eq!(sources.get("docs"), Some(&1));
    }

    #[test]
    fn test_delete_returns_count() {
        let store = InMemoryRecordStore::new();
        seed(&store);

        let removed = store
            .delete(&RecordFilter::new("agent-a", "default").with_source("kb"))
            .expect("delete failed");
        assert_eq!(removed, 1);

        let removed = store
            .delete(&RecordFilter::new("agent-a", "default"))
            .expect("delete failed");
        assert_eq!(removed, 2);

        // Nothing left to remove is not an error
        let removed = store
            .delete(&RecordFilter::new("agent-a", "default"))
            .expect("delete failed");
        assert_eq!(removed, 0);

        // Other namespace untouched
        assert_eq!(
            store
                .count(&RecordFilter::new("agent-a", "other"))
                .expect("count failed"),
            1
        );
    }
}
