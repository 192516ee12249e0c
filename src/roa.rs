//! Route Origin Authorizations.
//!
//! A `Roa` is the validated output of upstream certificate processing: an
//! origin ASN authorized to announce a prefix down to `max_length` bits.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::asn::Asn;
use crate::error::ValidationError;
use crate::prefix::{end_of_range, Prefix};

/// A cryptographically validated route origin authorization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RoaRecord", into = "RoaRecord")]
pub struct Roa {
    asn: Asn,
    prefix: Prefix,
    max_length: u8,
    end_prefix: Prefix,
}

impl Roa {
    /// Creates a ROA.
    ///
    /// # Errors
    /// Returns `MaxLengthOutOfRange` unless
    /// `prefix.length() <= max_length <= family width`.
    pub fn new(asn: Asn, prefix: Prefix, max_length: u8) -> Result<Self, ValidationError> {
        let width = prefix.family().width();
        if max_length < prefix.length() || max_length > width {
            return Err(ValidationError::MaxLengthOutOfRange {
                max_length,
                length: prefix.length(),
                width,
            });
        }
        Ok(Self {
            asn,
            prefix,
            max_length,
            end_prefix: end_of_range(&prefix, Some(max_length)),
        })
    }

    /// Creates a ROA whose max length equals its prefix length.
    #[must_use]
    pub fn exact(asn: Asn, prefix: Prefix) -> Self {
        Self {
            asn,
            prefix,
            max_length: prefix.length(),
            end_prefix: prefix,
        }
    }

    /// Authorized origin.
    #[must_use]
    pub const fn asn(&self) -> Asn {
        self.asn
    }

    /// Authorized prefix.
    #[must_use]
    pub const fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// Length of the authorized prefix.
    #[must_use]
    pub const fn prefix_length(&self) -> u8 {
        self.prefix.length()
    }

    /// Longest announcement length this ROA authorizes.
    #[must_use]
    pub const fn max_length(&self) -> u8 {
        self.max_length
    }

    /// Highest sub-prefix reachable within `max_length`.
    #[must_use]
    pub const fn end_prefix(&self) -> &Prefix {
        &self.end_prefix
    }

    /// Returns true if an announcement of `target` is within this ROA's
    /// prefix and max length.
    #[must_use]
    pub fn authorizes(&self, target: &Prefix) -> bool {
        self.prefix.contains(target) && target.length() <= self.max_length
    }
}

impl fmt::Display for Roa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{}", self.asn, self.prefix, self.max_length)
    }
}

/// Wire shape of a ROA; the end prefix is always recomputed.
#[derive(Serialize, Deserialize)]
struct RoaRecord {
    asn: Asn,
    prefix: Prefix,
    max_length: u8,
}

impl TryFrom<RoaRecord> for Roa {
    type Error = ValidationError;

    fn try_from(record: RoaRecord) -> Result<Self, Self::Error> {
        Self::new(record.asn, record.prefix, record.max_length)
    }
}

impl From<Roa> for RoaRecord {
    fn from(roa: Roa) -> Self {
        Self {
            asn: roa.asn,
            prefix: roa.prefix,
            max_length: roa.max_length,
        }
    }
}
