//! Storage layer abstraction.
//!
//! This module provides a two-layer storage architecture:
//! - **Records**: authoritative persistence of [`crate::VectorRecord`] rows
//!   (`SQLite`, in-memory)
//! - **Vector**: similarity search drivers (scan, pgvector)
//!
//! The concrete vector driver is chosen through configuration; shared logic
//! never inspects which backend is active.

// Allow cast precision loss for score calculations where exact precision is not critical.
#![allow(clippy::cast_precision_loss)]
// Allow significant_drop_tightening - dropping database connections slightly early
// provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

pub mod migrations;
pub mod records;
pub mod traits;
pub mod vector;

pub use traits::{GroupByField, RecordFilter, RecordStore, VectorMemoryDriver};

use crate::config::{DriverKind, VecmemConfig};
use crate::{Error, Result};
use std::sync::Arc;

/// Builds the vector driver selected by configuration.
///
/// - [`DriverKind::InMemory`] yields a [`vector::ScanDriver`] over a
///   [`records::SqliteRecordStore`] when `sqlite_path` is set, otherwise
///   over a [`records::InMemoryRecordStore`].
/// - [`DriverKind::Pgvector`] yields a [`vector::PgVectorDriver`] (requires
///   the `postgres` feature).
///
/// # Errors
///
/// Returns [`Error::Configuration`] when the selected backend cannot be
/// constructed, including when the crate was built without the feature the
/// backend requires.
pub fn driver_from_config(config: &VecmemConfig) -> Result<Arc<dyn VectorMemoryDriver>> {
    match config.driver {
        DriverKind::InMemory => {
            let store: Arc<dyn RecordStore> = match &config.sqlite_path {
                Some(path) => Arc::new(records::SqliteRecordStore::new(path)?),
                None => Arc::new(records::InMemoryRecordStore::new()),
            };
            Ok(Arc::new(vector::ScanDriver::new(store)))
        }
        DriverKind::Pgvector => pgvector_driver(config),
    }
}

#[cfg(feature = "postgres")]
fn pgvector_driver(config: &VecmemConfig) -> Result<Arc<dyn VectorMemoryDriver>> {
    let driver = vector::PgVectorDriver::new(
        &config.postgres.url,
        &config.postgres.table,
        config.postgres.dimensions,
    )?;
    Ok(Arc::new(driver))
}

#[cfg(not(feature = "postgres"))]
fn pgvector_driver(_config: &VecmemConfig) -> Result<Arc<dyn VectorMemoryDriver>> {
    Err(Error::Configuration {
        driver: "pgvector".to_string(),
        reason: "crate was built without the 'postgres' feature".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_driver_from_config() {
        let config = VecmemConfig::default();
        let driver = driver_from_config(&config).expect("factory failed");
        assert_eq!(driver.name(), "inmemory");
        assert!(driver.is_available());
    }

    #[cfg(not(feature = "postgres"))]
    #[test]
    fn test_pgvector_requires_feature() {
        let config = VecmemConfig {
            driver: DriverKind::Pgvector,
            ..VecmemConfig::default()
        };
        let err = driver_from_config(&config)
            .map(|_| ())
            .expect_err("must fail without feature");
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
