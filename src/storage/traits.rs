//! Abstract lookup traits over ROAs and SLURM records.
//!
//! Candidate lookups may over-approximate: the resolver re-checks every
//! candidate with the prefix algebra and imposes its own ordering, so a backend
//! is free to return candidates in any order.

use thiserror::Error;

use crate::asn::Asn;
use crate::prefix::Prefix;
use crate::roa::Roa;
use crate::slurm::{SlurmAssertion, SlurmFilter};

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Lookup did not complete in time.
    #[error("Storage lookup timed out after {duration_ms}ms")]
    Timeout {
        /// Elapsed time before giving up.
        duration_ms: u64,
    },

    /// Record already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Record does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Any other backend failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Read-only lookups over validated ROAs.
///
/// A single `validate` call expects a consistent view across all of these.
pub trait RoaStore: Send + Sync {
    /// ROAs whose prefix equals `prefix` exactly (every origin).
    fn find_exact_matches(&self, prefix: &Prefix) -> Result<Vec<Roa>, StorageError>;

    /// ROAs whose prefix may be a strict ancestor of `prefix`.
    fn find_covering_candidates(&self, prefix: &Prefix) -> Result<Vec<Roa>, StorageError>;

    /// ROAs whose prefix may be a strict descendant of `prefix`.
    fn find_more_specific_candidates(&self, prefix: &Prefix) -> Result<Vec<Roa>, StorageError>;

    /// Whether any ROA authorizes `asn` for any prefix.
    fn exists_for_asn(&self, asn: Asn) -> Result<bool, StorageError>;
}

/// Read-only lookups over local SLURM assertions and filters.
pub trait SlurmStore: Send + Sync {
    /// Assertions whose prefix equals `prefix` exactly.
    fn find_exact_assertions(&self, prefix: &Prefix) -> Result<Vec<SlurmAssertion>, StorageError>;

    /// Assertions whose prefix may be a strict ancestor of `prefix`.
    fn find_covering_assertion_candidates(
        &self,
        prefix: &Prefix,
    ) -> Result<Vec<SlurmAssertion>, StorageError>;

    /// Assertions whose prefix may be a strict descendant of `prefix`.
    fn find_more_specific_assertion_candidates(
        &self,
        prefix: &Prefix,
    ) -> Result<Vec<SlurmAssertion>, StorageError>;

    /// Filters that may apply to an announcement of `prefix` by `asn`.
    fn find_matching_filters(
        &self,
        asn: Asn,
        prefix: &Prefix,
    ) -> Result<Vec<SlurmFilter>, StorageError>;
}
