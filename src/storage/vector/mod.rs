//! Vector similarity search drivers.

mod pgvector;
mod scan;

pub use pgvector::{DEFAULT_DIMENSIONS, DEFAULT_TABLE, PgVectorDriver};
pub use scan::ScanDriver;
