//! # Vecmem
//!
//! A pluggable vector memory store for AI agents.
//!
//! Vecmem persists embedding vectors tagged with agent, namespace, and source
//! metadata, and serves nearest-neighbor cosine-similarity queries through a
//! single driver contract with interchangeable backends.
//!
//! ## Backends
//!
//! - **Scan** (`"inmemory"`): exact brute-force search. Pulls every record in
//!   the `(agent, namespace)` partition from the record store and scores it
//!   in-process. No external dependencies; O(N·D) per query.
//! - **pgvector** (`"pgvector"`): delegates ranking to PostgreSQL with the
//!   pgvector extension via the `<=>` cosine-distance operator. Requires the
//!   `postgres` feature.
//!
//! Both backends return the same result shape with the same threshold,
//! ordering, and limit semantics, so callers can swap backends through
//! configuration without behavioral drift.
//!
//! ## Example
//!
//! ```rust,ignore
//! use vecmem::{ScanDriver, SearchOptions, VectorMemoryDriver};
//! use vecmem::storage::records::SqliteRecordStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteRecordStore::new("./memories.db")?);
//! let driver = ScanDriver::new(store);
//! let results = driver.search(
//!     "support-agent",
//!     &query_embedding,
//!     &SearchOptions::new().with_threshold(0.75),
//! )?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod models;
pub mod observability;
pub mod similarity;
pub mod storage;

// Re-exports for convenience
pub use config::{DriverKind, PostgresConfig, VecmemConfig};
pub use models::{
    MemoryStats, NewVectorRecord, RecordId, SearchOptions, SearchResult, VectorRecord,
};
pub use similarity::cosine_similarity;
pub use storage::vector::{PgVectorDriver, ScanDriver};
pub use storage::{RecordFilter, RecordStore, VectorMemoryDriver, driver_from_config};

/// Error type for vecmem operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Configuration` | A backend is selected but unavailable or misconfigured |
/// | `Storage` | An underlying persistence or engine call failed |
/// | `DimensionMismatch` | Query vector length differs from a stored vector |
/// | `InvalidInput` | Missing required parameters, malformed config |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A backend was selected but is unavailable or misconfigured.
    ///
    /// Raised when:
    /// - The pgvector driver is used without a reachable PostgreSQL server
    /// - The pgvector extension is not installed in the target database
    /// - A driver name in configuration does not resolve to a backend
    #[error("driver '{driver}' is not available: {reason}")]
    Configuration {
        /// The driver that was selected.
        driver: String,
        /// Why the driver cannot serve the operation.
        reason: String,
    },

    /// An underlying persistence or engine operation failed.
    ///
    /// Raised when:
    /// - `SQLite` statements fail to prepare or execute
    /// - PostgreSQL queries fail or the connection pool is exhausted
    /// - Stored metadata or embeddings cannot be decoded
    ///
    /// The operation name carries the call-site context so callers never see
    /// a raw backend error without knowing which driver operation produced it.
    #[error("operation '{operation}' failed: {cause}")]
    Storage {
        /// The driver operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A query vector's length differs from the stored vector dimensionality.
    ///
    /// Similarity between vectors of different lengths is undefined; this is
    /// always a caller error, never silently coerced by truncation or padding.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality of the first operand.
        expected: usize,
        /// The dimensionality of the second operand.
        actual: usize,
    },

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A required parameter is empty (e.g., agent name)
    /// - A configuration file cannot be read or parsed
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for vecmem operations.
pub type Result<T> = std::result::Result<T, Error>;
