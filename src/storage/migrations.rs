//! PostgreSQL migration system for schema management.
//!
//! Provides a compile-time embedded migration system that upgrades the
//! vector table schema when a driver is constructed. Migration SQL may use
//! `{table}` and `{dimensions}` placeholders, filled in at run time.

#[cfg(feature = "postgres")]
mod implementation {
    use crate::{Error, Result};
    use deadpool_postgres::Pool;

    /// A single migration with version and SQL.
    #[derive(Debug, Clone, Copy)]
    pub struct Migration {
        /// Migration version (sequential, starting at 1).
        pub version: i32,
        /// Human-readable description.
        pub description: &'static str,
        /// SQL to apply (may contain multiple statements separated by
        /// semicolons). `{table}` and `{dimensions}` are placeholders.
        pub sql: &'static str,
    }

    /// Runs migrations for a PostgreSQL vector table.
    pub struct MigrationRunner {
        pool: Pool,
        table_name: String,
        dimensions: usize,
    }

    impl MigrationRunner {
        /// Creates a new migration runner.
        #[must_use]
        pub fn new(pool: Pool, table_name: impl Into<String>, dimensions: usize) -> Self {
            Self {
                pool,
                table_name: table_name.into(),
                dimensions,
            }
        }

        /// Runs all pending migrations.
        ///
        /// # Errors
        ///
        /// Returns an error if a migration fails.
        pub async fn run(&self, migrations: &[Migration]) -> Result<()> {
            let mut client = self.pool.get().await.map_err(|e| Error::Storage {
                operation: "migration_get_connection".to_string(),
                cause: e.to_string(),
            })?;

            self.ensure_migrations_table(&client).await?;
            let current_version = self.get_current_version(&client).await?;

            tracing::debug!(
                current_version,
                target_version = max_version(migrations),
                table = self.table_name,
                "Running migrations"
            );

            for migration in migrations {
                if migration.version > current_version {
                    self.apply_migration(&mut client, migration).await?;
                }
            }

            Ok(())
        }

        /// Returns the name of the migrations tracking table.
        fn migrations_table_name(&self) -> String {
            format!("{}_schema_migrations", self.table_name)
        }

        /// Ensures the tracking table exists.
        async fn ensure_migrations_table(&self, client: &deadpool_postgres::Object) -> Result<()> {
            let migrations_table = self.migrations_table_name();

            let sql = format!(
                r"
                CREATE TABLE IF NOT EXISTS {migrations_table} (
                    version INTEGER PRIMARY KEY,
                    description TEXT NOT NULL,
                    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "
            );

            client
                .execute(&sql, &[])
                .await
                .map_err(|e| Error::Storage {
                    operation: "create_migrations_table".to_string(),
                    cause: e.to_string(),
                })?;

            Ok(())
        }

        /// Gets the current schema version.
        async fn get_current_version(&self, client: &deadpool_postgres::Object) -> Result<i32> {
            let migrations_table = self.migrations_table_name();
            let sql = format!("SELECT COALESCE(MAX(version), 0) FROM {migrations_table}");

            let version: i32 = client
                .query_one(&sql, &[])
                .await
                .map(|row| row.get(0))
                .unwrap_or(0);

            Ok(version)
        }

        /// Applies a single migration within a transaction.
        ///
        /// All statements and the version record execute in one transaction,
        /// so a failing statement cannot leave a partial schema behind.
        async fn apply_migration(
            &self,
            client: &mut deadpool_postgres::Object,
            migration: &Migration,
        ) -> Result<()> {
            let migrations_table = self.migrations_table_name();

            let sql = migration
                .sql
                .replace("{table}", &self.table_name)
                .replace("{dimensions}", &self.dimensions.to_string());

            let tx = client.transaction().await.map_err(|e| Error::Storage {
                operation: format!("migration_v{}_begin_tx", migration.version),
                cause: e.to_string(),
            })?;

            for statement in sql.split(';') {
                let statement = statement.trim();
                if statement.is_empty() {
                    continue;
                }

                tx.execute(statement, &[])
                    .await
                    .map_err(|e| Error::Storage {
                        operation: format!(
                            "migration_v{}: {}",
                            migration.version, migration.description
                        ),
                        cause: e.to_string(),
                    })?;
            }

            let record_sql =
                format!("INSERT INTO {migrations_table} (version, description) VALUES ($1, $2)");

            tx.execute(&record_sql, &[&migration.version, &migration.description])
                .await
                .map_err(|e| Error::Storage {
                    operation: "record_migration".to_string(),
                    cause: e.to_string(),
                })?;

            tx.commit().await.map_err(|e| Error::Storage {
                operation: format!("migration_v{}_commit", migration.version),
                cause: e.to_string(),
            })?;

            tracing::info!(
                version = migration.version,
                description = migration.description,
                table = self.table_name,
                "Applied migration"
            );

            Ok(())
        }
    }

    /// Maximum version across a set of migrations.
    #[must_use]
    pub fn max_version(migrations: &[Migration]) -> i32 {
        migrations.iter().map(|m| m.version).max().unwrap_or(0)
    }
}

#[cfg(feature = "postgres")]
pub use implementation::{Migration, MigrationRunner, max_version};

#[cfg(not(feature = "postgres"))]
mod stub {
    /// A single migration with version and SQL (stub).
    #[derive(Debug, Clone, Copy)]
    pub struct Migration {
        /// Migration version.
        pub version: i32,
        /// Human-readable description.
        pub description: &'static str,
        /// SQL to apply.
        pub sql: &'static str,
    }

    /// Maximum version across a set of migrations.
    #[must_use]
    pub const fn max_version(migrations: &[Migration]) -> i32 {
        let mut max = 0;
        let mut i = 0;
        while i < migrations.len() {
            if migrations[i].version > max {
                max = migrations[i].version;
            }
            i += 1;
        }
        max
    }
}

#[cfg(not(feature = "postgres"))]
pub use stub::{Migration, max_version};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_version() {
        const MIGRATIONS: &[Migration] = &[
            Migration {
                version: 1,
                description: "first",
                sql: "SELECT 1",
            },
            Migration {
                version: 3,
                description: "third",
                sql: "SELECT 3",
            },
        ];
        assert_eq!(max_version(MIGRATIONS), 3);
        assert_eq!(max_version(&[]), 0);
    }
}
