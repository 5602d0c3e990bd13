//! Search options and results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{DEFAULT_NAMESPACE, RecordId, VectorRecord};

/// Default number of results returned by a search.
pub const DEFAULT_LIMIT: usize = 5;

/// Default minimum similarity for a record to appear in results.
pub const DEFAULT_THRESHOLD: f32 = 0.7;

/// Options for a similarity search.
///
/// Defaults match the driver contract: namespace `"default"`, limit 5,
/// threshold 0.7.
///
/// # Example
///
/// ```rust
/// use vecmem::SearchOptions;
///
/// let options = SearchOptions::new()
///     .with_namespace("docs")
///     .with_limit(10)
///     .with_threshold(0.6);
/// ```
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Namespace partition to search within.
    pub namespace: String,
    /// Maximum number of results. Zero yields an empty result set.
    pub limit: usize,
    /// Minimum cosine similarity. Values outside `[-1, 1]` are accepted
    /// verbatim (trivially satisfied or never satisfied).
    pub threshold: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            limit: DEFAULT_LIMIT,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl SearchOptions {
    /// Creates options with the contract defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the result limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the minimum similarity threshold.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }
}

/// A single scored search result.
///
/// Transient: produced per query, never persisted. Every backend returns
/// this same shape, so callers are insulated from the active driver.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Identifier of the matched record.
    pub id: RecordId,
    /// The owning agent.
    pub agent_name: String,
    /// The namespace partition.
    pub namespace: String,
    /// The original content.
    pub content: String,
    /// Decoded metadata map.
    pub metadata: Map<String, Value>,
    /// Provenance tag, if any.
    pub source: Option<String>,
    /// Identifier within the source, if any.
    pub source_id: Option<String>,
    /// Embedding provider name.
    pub embedding_provider: String,
    /// Embedding model name.
    pub embedding_model: String,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Cosine similarity to the query, in `[-1.0, 1.0]`.
    pub similarity: f32,
}

impl SearchResult {
    /// Builds a result from a record and its computed similarity.
    #[must_use]
    pub fn from_record(record: VectorRecord, similarity: f32) -> Self {
        Self {
            id: record.id,
            agent_name: record.agent_name,
            namespace: record.namespace,
            content: record.content,
            metadata: record.metadata,
            source: record.source,
            source_id: record.source_id,
            embedding_provider: record.embedding_provider,
            embedding_model: record.embedding_model,
            created_at: record.created_at,
            similarity,
        }
    }
}
