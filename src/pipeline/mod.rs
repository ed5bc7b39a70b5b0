// Source fan-out and persistence of what the sources return

pub mod aggregate;
pub mod ingest;

pub use aggregate::aggregate;
pub use ingest::{auto_ingest, CategoryReport, IngestReport, IngestionWriter, ModReport};
