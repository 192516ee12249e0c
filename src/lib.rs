//! # rpki-rov - RPKI Route Origin Validation
//!
//! Determines the RPKI validity of a BGP announcement, an (origin ASN, prefix)
//! pair, against validated ROAs and a local SLURM override layer (RFC 8416).
//!
//! ## Core Concepts
//!
//! - **Prefix**: fixed-width IPv4/IPv6 prefix with allocation-free bit algebra
//! - **Roa**: an origin authorized for a prefix down to a max length
//! - **SlurmAssertion / SlurmFilter**: local overrides; assertions act as
//!   trusted ROAs, filters withhold validity
//! - **ValidationResult**: validity, prefix and origin facets per RFC 6483,
//!   plus the deciding record
//!
//! Precedence is assertions, then filters, then ROAs. Storage is pluggable
//! through the read-only [`RoaStore`] and [`SlurmStore`] traits.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use rpki_rov::{Asn, InMemoryRoaStore, InMemorySlurmStore, Roa, RouteValidator, ValidityState};
//!
//! let roas = Arc::new(InMemoryRoaStore::new());
//! roas.insert(Roa::new(Asn::new(64496), "192.0.2.0/23".parse()?, 24)?)?;
//!
//! let validator = RouteValidator::new(roas, Arc::new(InMemorySlurmStore::new()));
//! let verdict = validator.validate_str("AS64496", "192.0.3.0/24")?;
//! assert_eq!(verdict.validity(), ValidityState::Valid);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asn;
pub mod config;
pub mod engine;
pub mod error;
pub mod prefix;
pub mod resolver;
pub mod roa;
pub mod slurm;
pub mod storage;
pub mod verdict;

// Re-export primary types at crate root for convenience
pub use asn::Asn;
pub use config::ValidatorConfig;
pub use engine::RouteValidator;
pub use error::{ConfigError, RpkiError, RpkiResult, ValidationError};
pub use prefix::{contained_in, end_of_range, AddressFamily, Prefix};
pub use roa::Roa;
pub use slurm::{SlurmAssertion, SlurmFilter};
pub use storage::{
    InMemoryRoaStore, InMemorySlurmStore, RoaStore, SlurmRecordId, SlurmStore, StorageError,
};
pub use verdict::{AsState, Evidence, PrefixState, ValidationResult, ValidityState};
