//! pgvector-backed vector driver.
//!
//! Delegates similarity ranking to PostgreSQL with the pgvector extension.
//! One SQL statement performs the filter, the distance computation, the
//! threshold predicate, the ordering, and the limit, so nothing is scored
//! in-process.

#[cfg(feature = "postgres")]
mod implementation {
    use crate::models::{MemoryStats, RecordId, SearchOptions, SearchResult, VectorRecord};
    use crate::storage::migrations::{Migration, MigrationRunner};
    use crate::storage::traits::VectorMemoryDriver;
    use crate::{Error, Result};
    use chrono::{DateTime, Utc};
    use deadpool_postgres::{Config, Pool, Runtime};
    use serde_json::Value;
    use std::collections::HashMap;
    use tokio::runtime::Handle;
    use tokio_postgres::NoTls;
    use tracing::{debug, error, info, instrument, warn};

    /// Default embedding dimensions (text-embedding-3-small / MiniLM class).
    pub const DEFAULT_DIMENSIONS: usize = 1536;

    /// Default vector table name.
    pub const DEFAULT_TABLE: &str = "agent_vector_memories";

    /// Embedded migrations compiled into the binary.
    /// Note: migration 1 assumes the pgvector extension is already
    /// installed. Run `CREATE EXTENSION IF NOT EXISTS vector;` first.
    const MIGRATIONS: &[Migration] = &[
        Migration {
            version: 1,
            description: "Initial vector memories table",
            sql: r"
                CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    agent_name TEXT NOT NULL,
                    namespace TEXT NOT NULL DEFAULT 'default',
                    content TEXT NOT NULL DEFAULT '',
                    metadata JSONB,
                    source TEXT,
                    source_id TEXT,
                    embedding_provider TEXT,
                    embedding_model TEXT,
                    embedding vector({dimensions}),
                    token_count INTEGER NOT NULL DEFAULT 0,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );
            ",
        },
        Migration {
            version: 2,
            description: "Add HNSW index for cosine similarity",
            sql: r"
                CREATE INDEX IF NOT EXISTS {table}_embedding_idx
                ON {table} USING hnsw (embedding vector_cosine_ops)
                WITH (m = 16, ef_construction = 64);
            ",
        },
        Migration {
            version: 3,
            description: "Add partition index for agent/namespace filtering",
            sql: r"
                CREATE INDEX IF NOT EXISTS {table}_agent_namespace_idx
                ON {table} (agent_name, namespace);
            ",
        },
    ];

    /// pgvector-backed vector driver.
    pub struct PgVectorDriver {
        /// Connection pool.
        pool: Pool,
        /// Vector table name.
        table_name: String,
        /// Embedding dimensions.
        dimensions: usize,
    }

    /// Helper to map pool errors.
    fn pool_error(e: impl std::fmt::Display) -> Error {
        Error::Storage {
            operation: "pgvector_get_client".to_string(),
            cause: e.to_string(),
        }
    }

    /// Helper to map query errors.
    fn query_error(op: &str, e: impl std::fmt::Display) -> Error {
        Error::Storage {
            operation: op.to_string(),
            cause: e.to_string(),
        }
    }

    impl PgVectorDriver {
        /// Creates a new pgvector driver and runs the embedded migrations.
        ///
        /// # Errors
        ///
        /// Returns an error if the connection pool fails to initialize or
        /// if migrations fail (which happens when the pgvector extension is
        /// not installed).
        pub fn new(
            connection_url: &str,
            table_name: impl Into<String>,
            dimensions: usize,
        ) -> Result<Self> {
            let driver = Self::connect_lazy(connection_url, table_name, dimensions)?;
            driver.run_migrations()?;
            Ok(driver)
        }

        /// Creates a driver without touching the database.
        ///
        /// For deployments that manage the schema externally. The first
        /// operation will surface any connectivity problem.
        ///
        /// # Errors
        ///
        /// Returns an error if the connection URL cannot be parsed.
        pub fn connect_lazy(
            connection_url: &str,
            table_name: impl Into<String>,
            dimensions: usize,
        ) -> Result<Self> {
            let table_name = table_name.into();
            let config = Self::parse_connection_url(connection_url)?;
            let cfg = Self::build_pool_config(&config);

            let pool = cfg
                .create_pool(Some(Runtime::Tokio1), NoTls)
                .map_err(|e| Error::Storage {
                    operation: "pgvector_create_pool".to_string(),
                    cause: e.to_string(),
                })?;

            Ok(Self {
                pool,
                table_name,
                dimensions,
            })
        }

        /// Creates a driver with default settings.
        ///
        /// # Errors
        ///
        /// Returns an error if the connection fails.
        pub fn with_defaults() -> Result<Self> {
            Self::new(
                "postgresql://localhost/vecmem",
                DEFAULT_TABLE,
                DEFAULT_DIMENSIONS,
            )
        }

        /// Returns the configured embedding dimensionality.
        #[must_use]
        pub const fn dimensions(&self) -> usize {
            self.dimensions
        }

        /// Parses the connection URL into a tokio-postgres config.
        fn parse_connection_url(url: &str) -> Result<tokio_postgres::Config> {
            url.parse::<tokio_postgres::Config>()
                .map_err(|e| Error::Configuration {
                    driver: "pgvector".to_string(),
                    reason: format!("invalid connection URL: {e}"),
                })
        }

        /// Extracts host string from tokio-postgres Host.
        #[cfg(unix)]
        fn host_to_string(h: &tokio_postgres::config::Host) -> String {
            match h {
                tokio_postgres::config::Host::Tcp(s) => s.clone(),
                tokio_postgres::config::Host::Unix(p) => p.to_string_lossy().to_string(),
            }
        }

        /// Extracts host string from tokio-postgres Host (Windows: Tcp only).
        #[cfg(not(unix))]
        fn host_to_string(h: &tokio_postgres::config::Host) -> String {
            let tokio_postgres::config::Host::Tcp(s) = h;
            s.clone()
        }

        /// Builds a deadpool config from a tokio-postgres config.
        fn build_pool_config(config: &tokio_postgres::Config) -> Config {
            let mut cfg = Config::new();
            cfg.host = config.get_hosts().first().map(Self::host_to_string);
            cfg.port = config.get_ports().first().copied();
            cfg.user = config.get_user().map(String::from);
            cfg.password = config
                .get_password()
                .map(|p| String::from_utf8_lossy(p).to_string());
            cfg.dbname = config.get_dbname().map(String::from);
            cfg
        }

        /// Runs a blocking operation on the async pool.
        fn block_on<F, T>(&self, f: F) -> Result<T>
        where
            F: std::future::Future<Output = Result<T>>,
        {
            if let Ok(handle) = Handle::try_current() {
                handle.block_on(f)
            } else {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| Error::Storage {
                        operation: "pgvector_create_runtime".to_string(),
                        cause: e.to_string(),
                    })?;
                rt.block_on(f)
            }
        }

        /// Runs migrations.
        fn run_migrations(&self) -> Result<()> {
            self.block_on(async {
                let runner =
                    MigrationRunner::new(self.pool.clone(), &self.table_name, self.dimensions);
                runner.run(MIGRATIONS).await
            })
        }

        /// Fails with a configuration error unless the backend is usable.
        ///
        /// Called before store/search/delete so they fail cleanly without
        /// attempting any engine call.
        fn ensure_available(&self) -> Result<()> {
            if self.is_available() {
                Ok(())
            } else {
                Err(Error::Configuration {
                    driver: "pgvector".to_string(),
                    reason: "requires a PostgreSQL connection with the pgvector extension"
                        .to_string(),
                })
            }
        }

        /// Formats an embedding as a pgvector literal: `[1.0,2.0,3.0]`.
        fn format_embedding(embedding: &[f32]) -> String {
            let values: Vec<String> = embedding
                .iter()
                .map(std::string::ToString::to_string)
                .collect();
            format!("[{}]", values.join(","))
        }

        /// Async implementation of the store operation.
        async fn store_async(&self, record: &VectorRecord) -> Result<bool> {
            let client = self.pool.get().await.map_err(pool_error)?;

            let embedding_str = Self::format_embedding(&record.embedding_vector);

            // The record row was already created by the ingestion path;
            // write only the embedding column.
            let update = format!(
                "UPDATE {} SET embedding = $1::vector WHERE id = $2",
                self.table_name
            );

            let rows = client
                .execute(&update, &[&embedding_str, &record.id.as_str()])
                .await
                .map_err(|e| query_error("pgvector_store", e))?;

            if rows == 0 {
                warn!(
                    record.id = %record.id,
                    agent_name = %record.agent_name,
                    "no row matched while attaching embedding"
                );
            }

            Ok(true)
        }

        /// Async implementation of the search operation.
        ///
        /// `1 - (embedding <=> query)` converts cosine distance into the
        /// same `[-1, 1]` similarity convention the scan driver uses, and
        /// ordering by distance ascending equals similarity descending.
        async fn search_async(
            &self,
            agent_name: &str,
            query_embedding: &[f32],
            options: &SearchOptions,
        ) -> Result<Vec<SearchResult>> {
            let client = self.pool.get().await.map_err(pool_error)?;
            let embedding_str = Self::format_embedding(query_embedding);

            let search_query = format!(
                "SELECT id, agent_name, namespace, content, metadata, source, source_id,
                        embedding_provider, embedding_model, created_at,
                        1 - (embedding <=> $1::vector) AS similarity
                 FROM {}
                 WHERE agent_name = $2
                   AND namespace = $3
                   AND 1 - (embedding <=> $1::vector) >= $4
                 ORDER BY embedding <=> $1::vector
                 LIMIT {}",
                self.table_name, options.limit
            );

            let threshold = f64::from(options.threshold);
            let rows = client
                .query(
                    &search_query,
                    &[&embedding_str, &agent_name, &options.namespace, &threshold],
                )
                .await
                .map_err(|e| query_error("pgvector_search", e))?;

            let mut results = Vec::with_capacity(rows.len());
            for row in &rows {
                let id: String = row.get(0);
                // Deserialize the JSONB metadata so callers see the same
                // shape the scan driver returns.
                let metadata = match row.get::<_, Option<Value>>(4) {
                    Some(Value::Object(map)) => map,
                    _ => serde_json::Map::new(),
                };
                let created_at: DateTime<Utc> = row.get(9);
                let similarity: f64 = row.get(10);

                #[allow(clippy::cast_possible_truncation)]
                results.push(SearchResult {
                    id: RecordId::new(id),
                    agent_name: row.get(1),
                    namespace: row.get(2),
                    content: row.get(3),
                    metadata,
                    source: row.get(5),
                    source_id: row.get(6),
                    embedding_provider: row
                        .get::<_, Option<String>>(7)
                        .unwrap_or_default(),
                    embedding_model: row.get::<_, Option<String>>(8).unwrap_or_default(),
                    created_at,
                    similarity: similarity as f32,
                });
            }

            Ok(results)
        }

        /// Async implementation of the delete operation.
        async fn delete_async(
            &self,
            agent_name: &str,
            namespace: &str,
            source: Option<&str>,
        ) -> Result<u64> {
            let client = self.pool.get().await.map_err(pool_error)?;

            let rows = if let Some(source) = source {
                let delete = format!(
                    "DELETE FROM {} WHERE agent_name = $1 AND namespace = $2 AND source = $3",
                    self.table_name
                );
                client
                    .execute(&delete, &[&agent_name, &namespace, &source])
                    .await
            } else {
                let delete = format!(
                    "DELETE FROM {} WHERE agent_name = $1 AND namespace = $2",
                    self.table_name
                );
                client.execute(&delete, &[&agent_name, &namespace]).await
            }
            .map_err(|e| query_error("pgvector_delete", e))?;

            Ok(rows)
        }

        /// Async implementation of the statistics operation.
        async fn statistics_async(&self, agent_name: &str, namespace: &str) -> Result<MemoryStats> {
            let client = self.pool.get().await.map_err(pool_error)?;

            let totals = format!(
                "SELECT COUNT(*), COALESCE(SUM(token_count), 0)::BIGINT
                 FROM {} WHERE agent_name = $1 AND namespace = $2",
                self.table_name
            );
            let row = client
                .query_one(&totals, &[&agent_name, &namespace])
                .await
                .map_err(|e| query_error("pgvector_statistics_totals", e))?;
            let total_memories: i64 = row.get(0);
            let total_tokens: i64 = row.get(1);

            let providers_query = format!(
                "SELECT embedding_provider, COUNT(*) FROM {}
                 WHERE agent_name = $1 AND namespace = $2 AND embedding_provider IS NOT NULL
                 GROUP BY embedding_provider",
                self.table_name
            );
            let providers = Self::grouped_rows(
                client
                    .query(&providers_query, &[&agent_name, &namespace])
                    .await
                    .map_err(|e| query_error("pgvector_statistics_providers", e))?,
            );

            let sources_query = format!(
                "SELECT source, COUNT(*) FROM {}
                 WHERE agent_name = $1 AND namespace = $2 AND source IS NOT NULL
                 GROUP BY source",
                self.table_name
            );
            let sources = Self::grouped_rows(
                client
                    .query(&sources_query, &[&agent_name, &namespace])
                    .await
                    .map_err(|e| query_error("pgvector_statistics_sources", e))?,
            );

            #[allow(clippy::cast_sign_loss)]
            Ok(MemoryStats {
                total_memories: total_memories as u64,
                total_tokens: total_tokens as u64,
                providers,
                sources,
                error: None,
            })
        }

        /// Folds `(key, count)` rows into a map.
        fn grouped_rows(rows: Vec<tokio_postgres::Row>) -> HashMap<String, u64> {
            rows.iter()
                .map(|row| {
                    let key: String = row.get(0);
                    let count: i64 = row.get(1);
                    #[allow(clippy::cast_sign_loss)]
                    (key, count as u64)
                })
                .collect()
        }

        /// Async implementation of the availability probe.
        async fn probe_async(&self) -> Result<bool> {
            let client = self.pool.get().await.map_err(pool_error)?;

            let row = client
                .query_opt("SELECT 1 FROM pg_extension WHERE extname = 'vector'", &[])
                .await
                .map_err(|e| query_error("pgvector_probe", e))?;

            Ok(row.is_some())
        }
    }

    impl VectorMemoryDriver for PgVectorDriver {
        #[instrument(skip(self, record), fields(backend = "pgvector", record.id = %record.id))]
        fn store(&self, record: &VectorRecord) -> Result<bool> {
            self.ensure_available()?;
            self.block_on(self.store_async(record))
        }

        #[instrument(skip(self, query_embedding), fields(backend = "pgvector"))]
        fn search(
            &self,
            agent_name: &str,
            query_embedding: &[f32],
            options: &SearchOptions,
        ) -> Result<Vec<SearchResult>> {
            self.ensure_available()?;

            if options.limit == 0 {
                return Ok(Vec::new());
            }

            let results = self.block_on(self.search_async(agent_name, query_embedding, options))?;

            debug!(
                agent_name,
                namespace = %options.namespace,
                results_count = results.len(),
                query_dimensions = query_embedding.len(),
                threshold = options.threshold,
                "pgvector search completed"
            );

            Ok(results)
        }

        #[instrument(skip(self), fields(backend = "pgvector"))]
        fn delete(&self, agent_name: &str, namespace: &str, source: Option<&str>) -> Result<u64> {
            self.ensure_available()?;

            let count = self.block_on(self.delete_async(agent_name, namespace, source))?;

            info!(agent_name, namespace, source, count, "deleted memories");
            Ok(count)
        }

        #[instrument(skip(self), fields(backend = "pgvector"))]
        fn statistics(&self, agent_name: &str, namespace: &str) -> Result<MemoryStats> {
            // Statistics are advisory: degrade to zeroed values instead of
            // failing, so dashboards keep rendering.
            match self.block_on(self.statistics_async(agent_name, namespace)) {
                Ok(stats) => Ok(stats),
                Err(e) => {
                    error!(agent_name, namespace, error = %e, "statistics collection failed");
                    Ok(MemoryStats::degraded(e.to_string()))
                }
            }
        }

        fn is_available(&self) -> bool {
            match self.block_on(self.probe_async()) {
                Ok(available) => available,
                Err(e) => {
                    debug!(error = %e, "pgvector availability probe failed");
                    false
                }
            }
        }

        fn name(&self) -> &'static str {
            "pgvector"
        }
    }

}

#[cfg(feature = "postgres")]
pub use implementation::{DEFAULT_DIMENSIONS, DEFAULT_TABLE, PgVectorDriver};

#[cfg(not(feature = "postgres"))]
mod stub {
    use crate::models::{MemoryStats, SearchOptions, SearchResult, VectorRecord};
    use crate::storage::traits::VectorMemoryDriver;
    use crate::{Error, Result};

    /// Default embedding dimensions (text-embedding-3-small / MiniLM class).
    pub const DEFAULT_DIMENSIONS: usize = 1536;

    /// Default vector table name.
    pub const DEFAULT_TABLE: &str = "agent_vector_memories";

    /// pgvector-backed vector driver (stub without the `postgres` feature).
    ///
    /// Reports itself unavailable and fails every hard operation with a
    /// configuration error, matching the contract's availability semantics.
    pub struct PgVectorDriver {
        table_name: String,
        dimensions: usize,
    }

    impl PgVectorDriver {
        /// Creates a new pgvector driver (stub).
        ///
        /// # Errors
        ///
        /// Never fails; kept for signature parity with the real driver.
        pub fn new(
            _connection_url: &str,
            table_name: impl Into<String>,
            dimensions: usize,
        ) -> Result<Self> {
            Ok(Self {
                table_name: table_name.into(),
                dimensions,
            })
        }

        /// Creates a driver with default settings (stub).
        ///
        /// # Errors
        ///
        /// Never fails; kept for signature parity with the real driver.
        pub fn with_defaults() -> Result<Self> {
            Self::new(
                "postgresql://localhost/vecmem",
                DEFAULT_TABLE,
                DEFAULT_DIMENSIONS,
            )
        }

        /// Returns the configured embedding dimensionality.
        #[must_use]
        pub const fn dimensions(&self) -> usize {
            self.dimensions
        }

        fn unavailable(&self) -> Error {
            Error::Configuration {
                driver: "pgvector".to_string(),
                reason: format!(
                    "crate was built without the 'postgres' feature (table '{}')",
                    self.table_name
                ),
            }
        }
    }

    impl VectorMemoryDriver for PgVectorDriver {
        fn store(&self, _record: &VectorRecord) -> Result<bool> {
            Err(self.unavailable())
        }

        fn search(
            &self,
            _agent_name: &str,
            _query_embedding: &[f32],
            _options: &SearchOptions,
        ) -> Result<Vec<SearchResult>> {
            Err(self.unavailable())
        }

        fn delete(&self, _agent_name: &str, _namespace: &str, _source: Option<&str>) -> Result<u64> {
            Err(self.unavailable())
        }

        fn statistics(&self, _agent_name: &str, _namespace: &str) -> Result<MemoryStats> {
            // Statistics soft-fail even in the stub.
            Ok(MemoryStats::degraded(self.unavailable().to_string()))
        }

        fn is_available(&self) -> bool {
            false
        }

        fn name(&self) -> &'static str {
            "pgvector"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::models::NewVectorRecord;
        use crate::models::RecordId;

        #[test]
        fn test_stub_fails_hard_operations_cleanly() {
            let driver = PgVectorDriver::with_defaults().expect("stub construction failed");
            assert!(!driver.is_available());
            assert_eq!(driver.name(), "pgvector");

            let record = NewVectorRecord::new("agent-a", "hello", vec![1.0])
                .into_record(RecordId::new("r1"));
            assert!(matches!(
                driver.store(&record),
                Err(Error::Configuration { .. })
            ));
            assert!(matches!(
                driver.search("agent-a", &[1.0], &SearchOptions::new()),
                Err(Error::Configuration { .. })
            ));
            assert!(matches!(
                driver.delete("agent-a", "default", None),
                Err(Error::Configuration { .. })
            ));
        }

        #[test]
        fn test_stub_statistics_degrade() {
            let driver = PgVectorDriver::with_defaults().expect("stub construction failed");
            let stats = driver
                .statistics("agent-a", "default")
                .expect("statistics must not fail");
            assert!(stats.is_empty());
            assert!(stats.error.is_some());
        }
    }
}

#[cfg(not(feature = "postgres"))]
pub use stub::{DEFAULT_DIMENSIONS, DEFAULT_TABLE, PgVectorDriver};
