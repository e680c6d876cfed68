//! Ingestion runs against a table store

mod loader;

pub use loader::{load_batch, run_ingestion, IngestReport};
