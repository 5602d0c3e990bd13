//! Record store collaborator interface.
//!
//! The record store is the authoritative persistence layer for
//! [`VectorRecord`] rows. The vector drivers consume this narrow interface
//! for fetching, deleting, and aggregating; id uniqueness and durability are
//! the store's responsibility, not the drivers'.

use crate::Result;
use crate::models::{NewVectorRecord, VectorRecord};
use std::collections::HashMap;

/// Filter scoping a record-store operation to a partition.
///
/// Always carries `(agent_name, namespace)`; `source` optionally refines
/// deletes and counts.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    /// The owning agent.
    pub agent_name: String,
    /// The namespace partition.
    pub namespace: String,
    /// Optional source refinement.
    pub source: Option<String>,
}

impl RecordFilter {
    /// Creates a partition filter.
    #[must_use]
    pub fn new(agent_name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            namespace: namespace.into(),
            source: None,
        }
    }

    /// Refines the filter by source tag.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Field to group by in [`RecordStore::grouped_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupByField {
    /// Group by embedding provider name.
    EmbeddingProvider,
    /// Group by source tag. Records without a source are excluded.
    Source,
}

/// Trait for record persistence backends.
///
/// Implementations must be thread-safe (`Send + Sync`); methods take `&self`
/// so stores can be shared via `Arc<dyn RecordStore>`, with interior
/// mutability for connection state.
pub trait RecordStore: Send + Sync {
    /// Persists a new record, allocating its id and creation timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] for an empty agent name and
    /// [`crate::Error::Storage`] if the insert fails.
    fn create(&self, record: NewVectorRecord) -> Result<VectorRecord>;

    /// Fetches all records matching the filter, in creation order.
    ///
    /// The fetch order is stable: the scan driver's tie-break for equal
    /// similarity scores depends on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails.
    fn filter(&self, filter: &RecordFilter) -> Result<Vec<VectorRecord>>;

    /// Counts records matching the filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the count fails.
    fn count(&self, filter: &RecordFilter) -> Result<u64>;

    /// Sums the token counts of records matching the filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the aggregation fails.
    fn sum_token_count(&self, filter: &RecordFilter) -> Result<u64>;

    /// Counts records matching the filter, grouped by the given field.
    ///
    /// Only keys with at least one record appear in the map.
    ///
    /// # Errors
    ///
    /// Returns an error if the aggregation fails.
    fn grouped_count(
        &self,
        filter: &RecordFilter,
        group_by: GroupByField,
    ) -> Result<HashMap<String, u64>>;

    /// Deletes records matching the filter, returning the count removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete(&self, filter: &RecordFilter) -> Result<u64>;
}
