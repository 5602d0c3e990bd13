//! Configuration management.
//!
//! Selects the active vector driver and its backend settings. Sources, in
//! increasing precedence: built-in defaults, a TOML config file, environment
//! variables (`VECMEM_DRIVER`, `VECMEM_POSTGRES_URL`). Callers that want
//! `.env` support run [`dotenvy::dotenv`] before loading.

use serde::Deserialize;
use std::path::PathBuf;

use crate::storage::vector::{DEFAULT_DIMENSIONS, DEFAULT_TABLE};

/// Available vector drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverKind {
    /// Brute-force scan over the record store ([`crate::ScanDriver`]).
    #[default]
    InMemory,
    /// PostgreSQL with the pgvector extension ([`crate::PgVectorDriver`]).
    Pgvector,
}

impl DriverKind {
    /// Parses a driver name, defaulting to the scan driver for anything
    /// unrecognized.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pgvector" | "postgres" | "postgresql" => Self::Pgvector,
            _ => Self::InMemory,
        }
    }

    /// Returns the stable driver name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InMemory => "inmemory",
            Self::Pgvector => "pgvector",
        }
    }
}

/// PostgreSQL backend settings.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Connection URL.
    pub url: String,
    /// Vector table name.
    pub table: String,
    /// Embedding dimensionality for the vector column.
    pub dimensions: usize,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/vecmem".to_string(),
            table: DEFAULT_TABLE.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
        }
    }
}

/// Main configuration for vecmem.
#[derive(Debug, Clone, Default)]
pub struct VecmemConfig {
    /// Which vector driver serves calls.
    pub driver: DriverKind,
    /// `SQLite` database path for the scan driver's record store.
    /// None keeps records in process memory.
    pub sqlite_path: Option<PathBuf>,
    /// PostgreSQL settings for the pgvector driver.
    pub postgres: PostgresConfig,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Driver name: "inmemory" or "pgvector".
    pub driver: Option<String>,
    /// `SQLite` database path.
    pub sqlite_path: Option<String>,
    /// PostgreSQL section.
    pub postgres: Option<ConfigFilePostgres>,
}

/// PostgreSQL section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFilePostgres {
    /// Connection URL.
    pub url: Option<String>,
    /// Vector table name.
    pub table: Option<String>,
    /// Embedding dimensionality.
    pub dimensions: Option<usize>,
}

impl VecmemConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path, then applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::Storage {
                operation: "read_config_file".to_string(),
                cause: e.to_string(),
            })?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::InvalidInput(format!(
                "failed to parse config file: {e}"
            )))?;

        Ok(Self::from_config_file(file).apply_env())
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/vecmem/` on macOS)
    /// 2. XDG config dir (`~/.config/vecmem/` for Unix compatibility)
    ///
    /// Returns default configuration (plus environment overrides) if no
    /// config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default().apply_env();
        };

        let platform_config = base_dirs.config_dir().join("vecmem").join("config.toml");
        if platform_config.exists() {
            if let Ok(config) = Self::load_from_file(&platform_config) {
                return config;
            }
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("vecmem")
            .join("config.toml");
        if xdg_config.exists() {
            if let Ok(config) = Self::load_from_file(&xdg_config) {
                return config;
            }
        }

        Self::default().apply_env()
    }

    /// Converts a [`ConfigFile`] into a [`VecmemConfig`].
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(driver) = file.driver {
            config.driver = DriverKind::parse(&driver);
        }
        if let Some(sqlite_path) = file.sqlite_path {
            config.sqlite_path = Some(PathBuf::from(sqlite_path));
        }
        if let Some(postgres) = file.postgres {
            if let Some(url) = postgres.url {
                config.postgres.url = url;
            }
            if let Some(table) = postgres.table {
                config.postgres.table = table;
            }
            if let Some(dimensions) = postgres.dimensions {
                config.postgres.dimensions = dimensions;
            }
        }

        config
    }

    /// Applies environment variable overrides.
    #[must_use]
    fn apply_env(mut self) -> Self {
        if let Ok(driver) = std::env::var("VECMEM_DRIVER") {
            self.driver = DriverKind::parse(&driver);
        }
        if let Ok(url) = std::env::var("VECMEM_POSTGRES_URL") {
            self.postgres.url = url;
        }
        self
    }

    /// Sets the driver.
    #[must_use]
    pub const fn with_driver(mut self, driver: DriverKind) -> Self {
        self.driver = driver;
        self
    }

    /// Sets the `SQLite` database path.
    #[must_use]
    pub fn with_sqlite_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sqlite_path = Some(path.into());
        self
    }
}
