//! Storage interfaces consumed by the validator.
//!
//! The validator only reads. Ingestion, schema and transactions belong to the
//! backend; `memory` is a reference backend for embedding and tests.

pub mod memory;
mod traits;

pub use memory::{InMemoryRoaStore, InMemorySlurmStore, SlurmRecordId};
pub use traits::{RoaStore, SlurmStore, StorageError};
