//! Storage trait definitions.

mod driver;
mod records;

pub use driver::VectorMemoryDriver;
pub use records::{GroupByField, RecordFilter, RecordStore};
