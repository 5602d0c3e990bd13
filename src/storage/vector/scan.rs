//! Brute-force scan driver.
//!
//! Exact search by full scan, for deployments without native vector
//! indexing. Pulls every record in the partition from the record store,
//! scores each one with [`cosine_similarity`], then filters, ranks, and
//! truncates in-process.
//!
//! Cost is O(N·D) per search, where N is the partition size and D the
//! vector dimensionality. This is the documented scalability ceiling of
//! this backend; switch to the pgvector driver for larger sets.

use crate::models::{MemoryStats, SearchOptions, SearchResult, VectorRecord};
use crate::similarity::cosine_similarity;
use crate::storage::traits::{GroupByField, RecordFilter, RecordStore, VectorMemoryDriver};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Exact brute-force vector driver over a [`RecordStore`].
pub struct ScanDriver {
    store: Arc<dyn RecordStore>,
}

impl ScanDriver {
    /// Creates a scan driver over the given record store.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Returns the backing record store.
    #[must_use]
    pub fn record_store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }
}

impl VectorMemoryDriver for ScanDriver {
    #[instrument(skip(self, record), fields(backend = "inmemory", record.id = %record.id))]
    fn store(&self, record: &VectorRecord) -> Result<bool> {
        // The embedding already lives alongside the rest of the record in
        // the record store; this confirms the contract and emits the event.
        debug!(
            agent_name = %record.agent_name,
            namespace = %record.namespace,
            "record stored in record store"
        );
        Ok(true)
    }

    #[instrument(skip(self, query_embedding), fields(backend = "inmemory"))]
    fn search(
        &self,
        agent_name: &str,
        query_embedding: &[f32],
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        debug!(
            agent_name,
            namespace = %options.namespace,
            query_dimensions = query_embedding.len(),
            limit = options.limit,
            threshold = options.threshold,
            "performing cosine similarity scan"
        );

        if options.limit == 0 {
            return Ok(Vec::new());
        }

        // No threshold pre-filtering at the storage layer; scoring decides.
        let records = self
            .store
            .filter(&RecordFilter::new(agent_name, &options.namespace))?;
        let total = records.len();

        let mut results = Vec::new();
        for record in records {
            let similarity = cosine_similarity(query_embedding, &record.embedding_vector)?;
            if similarity >= options.threshold {
                results.push(SearchResult::from_record(record, similarity));
            }
        }

        // Stable sort keeps equal scores in fetch order, so ties are
        // deterministic across runs on the same input order.
        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(options.limit);

        debug!(
            agent_name,
            namespace = %options.namespace,
            total_memories = total,
            results_count = results.len(),
            "scan search completed"
        );

        Ok(results)
    }

    #[instrument(skip(self), fields(backend = "inmemory"))]
    fn delete(&self, agent_name: &str, namespace: &str, source: Option<&str>) -> Result<u64> {
        let mut filter = RecordFilter::new(agent_name, namespace);
        if let Some(source) = source {
            filter = filter.with_source(source);
        }

        let count = self.store.delete(&filter)?;

        info!(agent_name, namespace, source, count, "deleted memories");
        Ok(count)
    }

    #[instrument(skip(self), fields(backend = "inmemory"))]
    fn statistics(&self, agent_name: &str, namespace: &str) -> Result<MemoryStats> {
        let filter = RecordFilter::new(agent_name, namespace);

        Ok(MemoryStats {
            total_memories: self.store.count(&filter)?,
            total_tokens: self.store.sum_token_count(&filter)?,
            providers: self
                .store
                .grouped_count(&filter, GroupByField::EmbeddingProvider)?,
            sources: self.store.grouped_count(&filter, GroupByField::Source)?,
            error: None,
        })
    }

    fn is_available(&self) -> bool {
        // No external dependency to probe.
        true
    }

    fn name(&self) -> &'static str {
        "inmemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewVectorRecord;
    use crate::storage::records::InMemoryRecordStore;
    use crate::Error;

    fn driver_with_store() -> (ScanDriver, Arc<InMemoryRecordStore>) {
        let store = Arc::new(InMemoryRecordStore::new());
        (ScanDriver::new(store.clone()), store)
    }

    fn seed_scenario(store: &InMemoryRecordStore) {
        // The three-record ranking scenario: [1,0], [0,1], [0.9,0.1]
        for (content, embedding) in [
            ("east", vec![1.0, 0.0]),
            ("north", vec![0.0, 1.0]),
            ("mostly-east", vec![0.9, 0.1]),
        ] {
            store
                .create(NewVectorRecord::new("agent-a", content, embedding))
                .expect("create failed");
        }
    }

    #[test]
    fn test_store_is_noop_success() {
        let (driver, store) = driver_with_store();
        let record = store
            .create(NewVectorRecord::new("agent-a", "hello", vec![1.0, 0.0]))
            .expect("create failed");
        assert!(driver.store(&record).expect("store failed"));
    }

    #[test]
    fn test_search_threshold_and_order() {
        let (driver, store) = driver_with_store();
        seed_scenario(&store);

        let results = driver
            .search("agent-a", &[1.0, 0.0], &SearchOptions::new())
            .expect("search failed");

        // [0,1] is orthogonal (similarity 0.0) and excluded by the 0.7
        // threshold; [1,0] outranks [0.9,0.1].
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "east");
        assert_eq!(results[1].content, "mostly-east");
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
        assert!(results[0].similarity >= results[1].similarity);
        assert!(results.iter().all(|r| r.similarity >= 0.7));
    }

    #[test]
    fn test_search_limit_zero_is_empty() {
        let (driver, store) = driver_with_store();
        seed_scenario(&store);

        let results = driver
            .search("agent-a", &[1.0, 0.0], &SearchOptions::new().with_limit(0))
            .expect("search failed");
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_limit_truncates() {
        let (driver, store) = driver_with_store();
        seed_scenario(&store);

        let results = driver
            .search(
                "agent-a",
                &[1.0, 0.0],
                &SearchOptions::new().with_limit(1).with_threshold(-1.0),
            )
            .expect("search failed");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "east");
    }

    #[test]
    fn test_search_no_match_is_empty_not_error() {
        let (driver, store) = driver_with_store();
        seed_scenario(&store);

        let results = driver
            .search(
                "agent-a",
                &[-1.0, 0.0],
                &SearchOptions::new().with_threshold(0.99),
            )
            .expect("search failed");
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_threshold_above_one_never_satisfied() {
        let (driver, store) = driver_with_store();
        seed_scenario(&store);

        let results = driver
            .search(
                "agent-a",
                &[1.0, 0.0],
                &SearchOptions::new().with_threshold(1.5),
            )
            .expect("search failed");
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_stable_tie_break() {
        let (driver, store) = driver_with_store();
        // Two records with identical embeddings tie exactly; fetch order
        // (creation order) must be preserved.
        for content in ["older", "newer"] {
            store
                .create(NewVectorRecord::new("agent-a", content, vec![0.6, 0.8]))
                .expect("create failed");
        }

        let results = driver
            .search("agent-a", &[0.6, 0.8], &SearchOptions::new())
            .expect("search failed");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "older");
        assert_eq!(results[1].content, "newer");
    }

    #[test]
    fn test_search_dimension_mismatch_fails_fast() {
        let (driver, store) = driver_with_store();
        seed_scenario(&store);

        let err = driver
            .search("agent-a", &[1.0, 0.0, 0.0], &SearchOptions::new())
            .expect_err("mismatch must fail");
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn test_search_scoped_to_partition() {
        let (driver, store) = driver_with_store();
        seed_scenario(&store);
        store
            .create(
                NewVectorRecord::new("agent-b", "other-agent", vec![1.0, 0.0])
                    .with_namespace("default"),
            )
            .expect("create failed");
        store
            .create(
                NewVectorRecord::new("agent-a", "other-namespace", vec![1.0, 0.0])
                    .with_namespace("docs"),
            )
            .expect("create failed");

        let results = driver
            .search("agent-a", &[1.0, 0.0], &SearchOptions::new())
            .expect("search failed");
        assert!(results.iter().all(|r| r.agent_name == "agent-a"));
        assert!(results.iter().all(|r| r.namespace == "default"));
    }

    #[test]
    fn test_delete_and_statistics() {
        let (driver, store) = driver_with_store();
        store
            .create(
                NewVectorRecord::new("agent-a", "a", vec![1.0, 0.0])
                    .with_source("kb")
                    .with_embedding_origin("openai", "m1")
                    .with_token_count(10),
            )
            .expect("create failed");
        store
            .create(
                NewVectorRecord::new("agent-a", "b", vec![0.0, 1.0])
                    .with_embedding_origin("openai", "m1")
                    .with_token_count(5),
            )
            .expect("create failed");

        let stats = driver
            .statistics("agent-a", "default")
            .expect("statistics failed");
        assert_eq!(stats.total_memories, 2);
        assert_eq!(stats.total_tokens, 15);
        assert_eq!(stats.providers.get("openai"), Some(&2));
        assert_eq!(stats.sources.get("kb"), Some(&1));
        assert!(stats.error.is_none());

        let removed = driver
            .delete("agent-a", "default", Some("kb"))
            .expect("delete failed");
        assert_eq!(removed, 1);

        let removed = driver
            .delete("agent-a", "default", None)
            .expect("delete failed");
        assert_eq!(removed, 1);

        let stats = driver
            .statistics("agent-a", "default")
            .expect("statistics failed");
        assert!(stats.is_empty());
        assert!(stats.providers.is_empty());
        assert!(stats.sources.is_empty());
    }

    #[test]
    fn test_statistics_empty_partition() {
        let (driver, _store) = driver_with_store();
        let stats = driver
            .statistics("agent-a", "default")
            .expect("statistics failed");
        assert_eq!(stats.total_memories, 0);
        assert_eq!(stats.total_tokens, 0);
        assert!(stats.providers.is_empty());
        assert!(stats.sources.is_empty());
    }

    #[test]
    fn test_identity_and_name() {
        let (driver, _store) = driver_with_store();
        assert!(driver.is_available());
        assert_eq!(driver.name(), "inmemory");
    }
}
