//! Observability and logging.
//!
//! The drivers emit structured `tracing` events at every operation boundary
//! (store, search, delete, statistics, availability probes). This module
//! installs a subscriber for binaries and tests that want those events on
//! stderr; libraries embedding vecmem normally install their own.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static LOGGING_INIT: OnceLock<()> = OnceLock::new();

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// Newline-delimited JSON.
    Json,
}

/// Initializes the global tracing subscriber.
///
/// Filtering follows `RUST_LOG` with an `info` default. Idempotent: a
/// second call (or an already-installed global subscriber) is a no-op, so
/// tests can call this freely.
pub fn init_logging(format: LogFormat) {
    LOGGING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);

        let result = match format {
            LogFormat::Text => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        // Another subscriber already being installed is fine.
        drop(result);
    });
}
