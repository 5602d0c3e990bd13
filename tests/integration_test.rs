//! Integration tests for vecmem.
//!
//! Exercises the full driver contract end-to-end over the `SQLite` record
//! store: record creation, store, search, delete, and statistics.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::sync::Arc;
use vecmem::storage::records::SqliteRecordStore;
use vecmem::{
    Error, NewVectorRecord, RecordStore, ScanDriver, SearchOptions, VectorMemoryDriver,
};

fn driver_with_store() -> (ScanDriver, Arc<SqliteRecordStore>) {
    let store = Arc::new(SqliteRecordStore::in_memory().expect("open failed"));
    (ScanDriver::new(store.clone()), store)
}

#[test]
fn test_error_types() {
    let err = Error::Configuration {
        driver: "pgvector".to_string(),
        reason: "extension missing".to_string(),
    };
    let display = format!("{err}");
    assert!(display.contains("pgvector"));
    assert!(display.contains("extension missing"));

    let err = Error::Storage {
        operation: "search".to_string(),
        cause: "disk full".to_string(),
    };
    let display = format!("{err}");
    assert!(display.contains("search"));
    assert!(display.contains("disk full"));

    let err = Error::DimensionMismatch {
        expected: 3,
        actual: 2,
    };
    let display = format!("{err}");
    assert!(display.contains('3'));
    assert!(display.contains('2'));

    let err = Error::InvalidInput("agent name is empty".to_string());
    assert!(format!("{err}").contains("invalid input"));
}

#[test]
fn test_store_then_search_roundtrip() {
    let (driver, store) = driver_with_store();

    let embedding = vec![0.6, 0.8, 0.0];
    let record = store
        .create(
            NewVectorRecord::new("agentA", "remember this", embedding.clone())
                .with_embedding_origin("openai", "text-embedding-3-small")
                .with_token_count(3),
        )
        .expect("create failed");

    assert!(driver.store(&record).expect("store failed"));

    // A record queried with its own embedding scores ~1.0.
    let results = driver
        .search("agentA", &embedding, &SearchOptions::new())
        .expect("search failed");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, record.id);
    assert!((results[0].similarity - 1.0).abs() < 1e-5);
    assert_eq!(results[0].content, "remember this");
}

#[test]
fn test_ranking_scenario() {
    let (driver, store) = driver_with_store();

    for (content, embedding) in [
        ("east", vec![1.0, 0.0]),
        ("north", vec![0.0, 1.0]),
        ("mostly-east", vec![0.9, 0.1]),
    ] {
        store
            .create(NewVectorRecord::new("agentA", content, embedding))
            .expect("create failed");
    }

    let results = driver
        .search(
            "agentA",
            &[1.0, 0.0],
            &SearchOptions::new().with_threshold(0.7).with_limit(5),
        )
        .expect("search failed");

    // The orthogonal record is below the threshold; the exact match ranks
    // ahead of the near match.
    let contents: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents, vec!["east", "mostly-east"]);
    assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    assert!(results.iter().all(|r| r.similarity >= 0.7));
}

#[test]
fn test_limit_zero_returns_empty() {
    let (driver, store) = driver_with_store();
    store
        .create(NewVectorRecord::new("agentA", "anything", vec![1.0, 0.0]))
        .expect("create failed");

    let results = driver
        .search("agentA", &[1.0, 0.0], &SearchOptions::new().with_limit(0))
        .expect("search failed");
    assert!(results.is_empty());
}

#[test]
fn test_delete_then_search_and_statistics_reflect_removal() {
    let (driver, store) = driver_with_store();

    for i in 0..3 {
        store
            .create(
                NewVectorRecord::new("agentA", format!("memory {i}"), vec![1.0, 0.0])
                    .with_source("ingest")
                    .with_embedding_origin("openai", "m1")
                    .with_token_count(4),
            )
            .expect("create failed");
    }

    let removed = driver
        .delete("agentA", "default", Some("ingest"))
        .expect("delete failed");
    assert_eq!(removed, 3);

    let results = driver
        .search("agentA", &[1.0, 0.0], &SearchOptions::new())
        .expect("search failed");
    assert!(results.is_empty());

    let stats = driver
        .statistics("agentA", "default")
        .expect("statistics failed");
    assert_eq!(stats.total_memories, 0);
    assert_eq!(stats.total_tokens, 0);
    assert!(stats.providers.is_empty());
    assert!(stats.sources.is_empty());
    assert!(stats.error.is_none());
}

#[test]
fn test_statistics_aggregation() {
    let (driver, store) = driver_with_store();

    store
        .create(
            NewVectorRecord::new("agentA", "a", vec![1.0, 0.0])
                .with_source("kb")
                .with_embedding_origin("openai", "m1")
                .with_token_count(10),
        )
        .expect("create failed");
    store
        .create(
            NewVectorRecord::new("agentA", "b", vec![0.0, 1.0])
                .with_source("kb")
                .with_embedding_origin("ollama", "m2")
                .with_token_count(7),
        )
        .expect("create failed");
    store
        .create(
            NewVectorRecord::new("agentA", "c", vec![0.5, 0.5])
                .with_embedding_origin("openai", "m1")
                .with_token_count(2),
        )
        .expect("create failed");

    let stats = driver
        .statistics("agentA", "default")
        .expect("statistics failed");
    assert_eq!(stats.total_memories, 3);
    assert_eq!(stats.total_tokens, 19);
    assert_eq!(stats.providers.get("openai"), Some(&2));
    assert_eq!(stats.providers.get("ollama"), Some(&1));
    // The sourceless record does not appear in the source map.
    assert_eq!(stats.sources.len(), 1);
    assert_eq!(stats.sources.get("kb"), Some(&2));
}

#[test]
fn test_partitions_are_isolated() {
    let (driver, store) = driver_with_store();

    store
        .create(NewVectorRecord::new("agentA", "mine", vec![1.0, 0.0]))
        .expect("create failed");
    store
        .create(NewVectorRecord::new("agentB", "theirs", vec![1.0, 0.0]))
        .expect("create failed");
    store
        .create(
            NewVectorRecord::new("agentA", "elsewhere", vec![1.0, 0.0]).with_namespace("docs"),
        )
        .expect("create failed");

    let results = driver
        .search("agentA", &[1.0, 0.0], &SearchOptions::new())
        .expect("search failed");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].content, "mine");

    let removed = driver.delete("agentA", "default", None).expect("delete failed");
    assert_eq!(removed, 1);

    // The other partitions are untouched.
    let results = driver
        .search(
            "agentA",
            &[1.0, 0.0],
            &SearchOptions::new().with_namespace("docs"),
        )
        .expect("search failed");
    assert_eq!(results.len(), 1);
    let results = driver
        .search("agentB", &[1.0, 0.0], &SearchOptions::new())
        .expect("search failed");
    assert_eq!(results.len(), 1);
}

#[test]
fn test_dimension_mismatch_is_loud() {
    let (driver, store) = driver_with_store();
    store
        .create(NewVectorRecord::new("agentA", "2d", vec![1.0, 0.0]))
        .expect("create failed");

    let err = driver
        .search("agentA", &[1.0, 0.0, 0.0], &SearchOptions::new())
        .expect_err("mismatch must fail");
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}

#[test]
fn test_driver_factory_selects_scan_backend() {
    let config = vecmem::VecmemConfig::default();
    let driver = vecmem::driver_from_config(&config).expect("factory failed");
    assert_eq!(driver.name(), "inmemory");
    assert!(driver.is_available());

    // The factory-built driver serves the contract end to end.
    let results = driver
        .search("agentA", &[1.0, 0.0], &SearchOptions::new())
        .expect("search failed");
    assert!(results.is_empty());
}
