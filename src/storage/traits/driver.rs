//! Vector memory driver contract.
//!
//! Every backend implements this trait; callers select a concrete driver
//! through configuration (see [`crate::storage::driver_from_config`]) and
//! never branch on the active backend inside shared logic.
//!
//! # Available Implementations
//!
//! | Backend | Name | Use Case |
//! |---------|------|----------|
//! | [`ScanDriver`](crate::ScanDriver) | `"inmemory"` | Exact search over a bounded working set |
//! | [`PgVectorDriver`](crate::PgVectorDriver) | `"pgvector"` | Index-accelerated search in PostgreSQL |
//!
//! # Semantics
//!
//! Search results are identical across backends for the same data: every
//! result's similarity is at least the threshold, results are ordered by
//! similarity descending, and at most `limit` entries are returned.

use crate::Result;
use crate::models::{MemoryStats, SearchOptions, SearchResult, VectorRecord};

/// Trait for vector memory backends.
///
/// Implementations are request-scoped and stateless between calls: each
/// operation is a self-contained unit of work, and correctness under
/// concurrent callers is delegated to the underlying store's transactional
/// guarantees. Implementations must be thread-safe (`Send + Sync`); use
/// interior mutability for any connection state.
pub trait VectorMemoryDriver: Send + Sync {
    /// Persists or finalizes the record's embedding.
    ///
    /// The record row itself is created by the ingestion path before this is
    /// called; backends either treat this as a confirmation (scan) or write
    /// the embedding through a narrow update path (pgvector). Either the
    /// embedding is attached or the call fails with prior state unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Configuration`] if the backend is unavailable
    /// and [`crate::Error::Storage`] if the write fails.
    fn store(&self, record: &VectorRecord) -> Result<bool>;

    /// Searches the `(agent_name, namespace)` partition for records similar
    /// to `query_embedding`.
    ///
    /// Returns records with similarity at least `options.threshold`, ordered
    /// by similarity descending, truncated to `options.limit`. An empty
    /// result set is not an error; `limit == 0` always yields one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DimensionMismatch`] when the query vector
    /// length differs from a stored vector, [`crate::Error::Configuration`]
    /// when the backend is unavailable, and [`crate::Error::Storage`] when
    /// the underlying engine call fails.
    fn search(
        &self,
        agent_name: &str,
        query_embedding: &[f32],
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>>;

    /// Deletes all records in the partition, additionally filtered by
    /// `source` when provided. Returns the count removed; zero matches is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable or the delete fails.
    fn delete(&self, agent_name: &str, namespace: &str, source: Option<&str>) -> Result<u64>;

    /// Returns aggregate statistics for the partition.
    ///
    /// The scan backend propagates failures; the pgvector backend instead
    /// returns zeroed statistics with [`MemoryStats::error`] populated, so
    /// advisory dashboards degrade instead of breaking.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing record store fails (scan backend).
    fn statistics(&self, agent_name: &str, namespace: &str) -> Result<MemoryStats>;

    /// Non-throwing capability probe.
    ///
    /// Operations that require the backend must fail cleanly, without
    /// partial execution, when this returns false.
    fn is_available(&self) -> bool;

    /// Stable backend identifier for diagnostics and selection.
    ///
    /// Never used to branch similarity logic.
    fn name(&self) -> &'static str;
}
