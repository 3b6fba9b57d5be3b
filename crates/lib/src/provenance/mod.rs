//! Provenance records.
//!
//! A [`ProvenanceRecord`] ties a set of built images to the exact source state
//! and orchestrator revision that produced them. One record is kept per
//! implementation, in `<implementation-dir>/.last-build.json`.

mod storage;
mod types;

pub use storage::{load_record, write_record};
pub use types::{ImageRecord, ProvenanceError, ProvenanceRecord};
