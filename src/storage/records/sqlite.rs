//! `SQLite`-based record store.
//!
//! Durable storage for vector records using `SQLite` as the authoritative
//! source of truth. The embedding and the metadata map cross the storage
//! boundary as JSON text.

use crate::models::{NewVectorRecord, RecordId, VectorRecord};
use crate::storage::traits::{GroupByField, RecordFilter, RecordStore};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Helper to map `SQLite` errors with operation context.
fn storage_error(operation: &str, e: impl std::fmt::Display) -> Error {
    Error::Storage {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

/// `SQLite`-based record store.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` for thread-safe access because
/// `rusqlite::Connection` is not `Sync`. WAL mode and `busy_timeout`
/// mitigate contention:
///
/// - **WAL mode**: allows concurrent readers with a single writer
/// - **`busy_timeout`**: waits up to 5 seconds for locks instead of failing
/// - **NORMAL synchronous**: balances durability with performance
pub struct SqliteRecordStore {
    /// Connection to the `SQLite` database.
    conn: Mutex<Connection>,
    /// Path to the database file (None for in-memory).
    db_path: Option<PathBuf>,
}

impl SqliteRecordStore {
    /// Creates a new `SQLite` record store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn =
            Connection::open(&db_path).map_err(|e| storage_error("open_sqlite", e))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory `SQLite` record store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| storage_error("open_sqlite_in_memory", e))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub const fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Initializes pragmas and the schema.
    fn initialize(&self) -> Result<()> {
        let conn = self.lock();

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| storage_error("configure_sqlite", e))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS agent_vector_memories (
                id TEXT PRIMARY KEY,
                agent_name TEXT NOT NULL,
                namespace TEXT NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                source TEXT,
                source_id TEXT,
                embedding_provider TEXT NOT NULL,
                embedding_model TEXT NOT NULL,
                embedding TEXT NOT NULL,
                token_count INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| storage_error("create_memories_table", e))?;

        Self::create_indexes(&conn);
        Ok(())
    }

    /// Creates indexes for common query patterns.
    fn create_indexes(conn: &Connection) {
        // Partition index: every driver operation filters on these two
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_avm_agent_namespace
             ON agent_vector_memories(agent_name, namespace)",
            [],
        );

        // Source index for filtered deletes and statistics
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_avm_source ON agent_vector_memories(source)",
            [],
        );
    }

    /// Builds the WHERE clause and parameters for a filter.
    fn where_clause(filter: &RecordFilter) -> (&'static str, Vec<&str>) {
        filter.source.as_deref().map_or_else(
            || {
                (
                    "agent_name = ?1 AND namespace = ?2",
                    vec![filter.agent_name.as_str(), filter.namespace.as_str()],
                )
            },
            |source| {
                (
                    "agent_name = ?1 AND namespace = ?2 AND source = ?3",
                    vec![
                        filter.agent_name.as_str(),
                        filter.namespace.as_str(),
                        source,
                    ],
                )
            },
        )
    }

    /// Converts a result row into a [`VectorRecord`].
    fn record_from_row(row: &Row<'_>) -> rusqlite::Result<VectorRecord> {
        let id: String = row.get(0)?;
        let metadata_json: String = row.get(4)?;
        let embedding_json: String = row.get(9)?;
        let created_at_str: String = row.get(11)?;

        let metadata = serde_json::from_str(&metadata_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let embedding_vector: Vec<f32> = serde_json::from_str(&embedding_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    11,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?
            .with_timezone(&Utc);

        Ok(VectorRecord {
            id: RecordId::new(id),
            agent_name: row.get(1)?,
            namespace: row.get(2)?,
            content: row.get(3)?,
            metadata,
            source: row.get(5)?,
            source_id: row.get(6)?,
            embedding_provider: row.get(7)?,
            embedding_model: row.get(8)?,
            embedding_vector,
            token_count: row.get(10)?,
            created_at,
        })
    }
}

impl RecordStore for SqliteRecordStore {
    fn create(&self, record: NewVectorRecord) -> Result<VectorRecord> {
        if record.agent_name.is_empty() {
            return Err(Error::InvalidInput("agent name is empty".to_string()));
        }

        let record = record.into_record(RecordId::generate());

        let metadata_json = serde_json::to_string(&record.metadata)
            .map_err(|e| storage_error("serialize_metadata", e))?;
        let embedding_json = serde_json::to_string(&record.embedding_vector)
            .map_err(|e| storage_error("serialize_embedding", e))?;

        let conn = self.lock();
        conn.execute(
            "INSERT INTO agent_vector_memories
             (id, agent_name, namespace, content, metadata, source, source_id,
              embedding_provider, embedding_model, embedding, token_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                record.id.as_str(),
                record.agent_name,
                record.namespace,
                record.content,
                metadata_json,
                record.source,
                record.source_id,
                record.embedding_provider,
                record.embedding_model,
                embedding_json,
                record.token_count,
                record.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| storage_error("insert_record", e))?;

        Ok(record)
    }

    fn filter(&self, filter: &RecordFilter) -> Result<Vec<VectorRecord>> {
        let (clause, bindings) = Self::where_clause(filter);
        let sql = format!(
            "SELECT id, agent_name, namespace, content, metadata, source, source_id,
                    embedding_provider, embedding_model, embedding, token_count, created_at
             FROM agent_vector_memories
             WHERE {clause}
             ORDER BY created_at ASC, id ASC"
        );

        let conn = self.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| storage_error("prepare_filter", e))?;

        let rows = stmt
            .query_map(rusqlite::params_from_iter(bindings), Self::record_from_row)
            .map_err(|e| storage_error("query_records", e))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| storage_error("read_record_row", e))?);
        }
        Ok(records)
    }

    fn count(&self, filter: &RecordFilter) -> Result<u64> {
        let (clause, bindings) = Self::where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM agent_vector_memories WHERE {clause}");

        let conn = self.lock();
        let count: i64 = conn
            .query_row(&sql, rusqlite::params_from_iter(bindings), |row| row.get(0))
            .map_err(|e| storage_error("count_records", e))?;

        #[allow(clippy::cast_sign_loss)]
        Ok(count as u64)
    }

    fn sum_token_count(&self, filter: &RecordFilter) -> Result<u64> {
        let (clause, bindings) = Self::where_clause(filter);
        let sql = format!(
            "SELECT COALESCE(SUM(token_count), 0) FROM agent_vector_memories WHERE {clause}"
        );

        let conn = self.lock();
        let total: i64 = conn
            .query_row(&sql, rusqlite::params_from_iter(bindings), |row| row.get(0))
            .map_err(|e| storage_error("sum_token_count", e))?;

        #[allow(clippy::cast_sign_loss)]
        Ok(total as u64)
    }

    fn grouped_count(
        &self,
        filter: &RecordFilter,
        group_by: GroupByField,
    ) -> Result<HashMap<String, u64>> {
        let (clause, bindings) = Self::where_clause(filter);
        let sql = match group_by {
            GroupByField::EmbeddingProvider => format!(
                "SELECT embedding_provider, COUNT(*) FROM agent_vector_memories
                 WHERE {clause} GROUP BY embedding_provider"
            ),
            GroupByField::Source => format!(
                "SELECT source, COUNT(*) FROM agent_vector_memories
                 WHERE {clause} AND source IS NOT NULL GROUP BY source"
            ),
        };

        let conn = self.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| storage_error("prepare_grouped_count", e))?;

        let rows = stmt
            .query_map(rusqlite::params_from_iter(bindings), |row| {
                let key: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((key, count))
            })
            .map_err(|e| storage_error("query_grouped_count", e))?;

        let mut counts = HashMap::new();
        for row in rows {
            let (key, count) = row.map_err(|e| storage_error("read_grouped_row", e))?;
            #[allow(clippy::cast_sign_loss)]
            counts.insert(key, count as u64);
        }
        Ok(counts)
    }

    fn delete(&self, filter: &RecordFilter) -> Result<u64> {
        let (clause, bindings) = Self::where_clause(filter);
        let sql = format!("DELETE FROM agent_vector_memories WHERE {clause}");

        let conn = self.lock();
        let removed = conn
            .execute(&sql, rusqlite::params_from_iter(bindings))
            .map_err(|e| storage_error("delete_records", e))?;

        Ok(removed as u64)
    }
}
