//! Domain models for vector memory.

mod record;
mod search;
mod stats;

pub use record::{NewVectorRecord, RecordId, VectorRecord};
pub use search::{SearchOptions, SearchResult};
pub use stats::MemoryStats;

/// Namespace assigned to records when the caller does not specify one.
pub const DEFAULT_NAMESPACE: &str = "default";
