//! The validation verdict.
//!
//! A `ValidationResult` carries the three independent facets of RFC 6483
//! route validation plus, when one was found, the record that decided it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::roa::Roa;
use crate::slurm::{SlurmAssertion, SlurmFilter};

/// Overall route validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidityState {
    /// An authorization covers the announcement and its origin.
    Valid,
    /// An authorization covers the prefix but not this announcement.
    Invalid,
    /// No authorization speaks to the announcement.
    Unknown,
}

/// How the announced prefix relates to the deciding record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrefixState {
    /// The announcement is within the record's prefix and max length.
    Match,
    /// The announcement is more specific than the record permits.
    MoreSpecific,
    /// The announcement covers a more specific record.
    CoveringAggregate,
    /// No record intersects the announcement.
    NonIntersecting,
}

/// Whether the announced origin equals the record's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AsState {
    /// Same origin.
    Matching,
    /// Different (or no) origin.
    NonMatching,
}

impl AsState {
    /// Maps an origin comparison to an `AsState`.
    #[must_use]
    pub const fn from_match(matching: bool) -> Self {
        if matching {
            Self::Matching
        } else {
            Self::NonMatching
        }
    }
}

impl fmt::Display for ValidityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "VALID"),
            Self::Invalid => write!(f, "INVALID"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl fmt::Display for PrefixState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match => write!(f, "MATCH"),
            Self::MoreSpecific => write!(f, "MORE_SPECIFIC"),
            Self::CoveringAggregate => write!(f, "COVERING_AGGREGATE"),
            Self::NonIntersecting => write!(f, "NON_INTERSECTING"),
        }
    }
}

impl fmt::Display for AsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matching => write!(f, "MATCHING"),
            Self::NonMatching => write!(f, "NON_MATCHING"),
        }
    }
}

/// The record that decided a verdict. At most one is ever attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "record")]
pub enum Evidence {
    /// A ROA from the RPKI.
    Roa(Roa),
    /// A local SLURM assertion.
    Assertion(SlurmAssertion),
    /// A local SLURM filter.
    Filter(SlurmFilter),
}

/// Immutable outcome of one validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    validity: ValidityState,
    prefix_state: PrefixState,
    as_state: AsState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    evidence: Option<Evidence>,
}

impl ValidationResult {
    /// Creates a verdict.
    #[must_use]
    pub const fn new(
        validity: ValidityState,
        prefix_state: PrefixState,
        as_state: AsState,
        evidence: Option<Evidence>,
    ) -> Self {
        Self {
            validity,
            prefix_state,
            as_state,
            evidence,
        }
    }

    /// Overall validity.
    #[must_use]
    pub const fn validity(&self) -> ValidityState {
        self.validity
    }

    /// Prefix relation to the deciding record.
    #[must_use]
    pub const fn prefix_state(&self) -> PrefixState {
        self.prefix_state
    }

    /// Origin relation to the deciding record.
    #[must_use]
    pub const fn as_state(&self) -> AsState {
        self.as_state
    }

    /// The deciding record, if any.
    #[must_use]
    pub const fn evidence(&self) -> Option<&Evidence> {
        self.evidence.as_ref()
    }

    /// The deciding ROA, if a ROA decided.
    #[must_use]
    pub fn matched_roa(&self) -> Option<&Roa> {
        match &self.evidence {
            Some(Evidence::Roa(roa)) => Some(roa),
            _ => None,
        }
    }

    /// The deciding assertion, if an assertion decided.
    #[must_use]
    pub fn matched_assertion(&self) -> Option<&SlurmAssertion> {
        match &self.evidence {
            Some(Evidence::Assertion(a)) => Some(a),
            _ => None,
        }
    }

    /// The deciding filter, if a filter decided.
    #[must_use]
    pub fn matched_filter(&self) -> Option<&SlurmFilter> {
        match &self.evidence {
            Some(Evidence::Filter(f)) => Some(f),
            _ => None,
        }
    }

    /// Shorthand for `validity() == ValidityState::Valid`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validity == ValidityState::Valid
    }

    /// The three facets as a tuple; convenient in assertions.
    #[must_use]
    pub const fn states(&self) -> (ValidityState, PrefixState, AsState) {
        (self.validity, self.prefix_state, self.as_state)
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.validity, self.prefix_state, self.as_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn::Asn;

    #[test]
    fn evidence_is_exclusive() {
        let roa = Roa::exact(Asn::new(64496), "192.0.2.0/24".parse().unwrap());
        let result = ValidationResult::new(
            ValidityState::Valid,
            PrefixState::Match,
            AsState::Matching,
            Some(Evidence::Roa(roa.clone())),
        );
        assert_eq!(result.matched_roa(), Some(&roa));
        assert!(result.matched_assertion().is_none());
        assert!(result.matched_filter().is_none());
        assert!(result.is_valid());
    }

    #[test]
    fn serializes_states_in_rfc_spelling() {
        let result = ValidationResult::new(
            ValidityState::Unknown,
            PrefixState::NonIntersecting,
            AsState::NonMatching,
            None,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["validity"], "UNKNOWN");
        assert_eq!(json["prefix_state"], "NON_INTERSECTING");
        assert_eq!(json["as_state"], "NON_MATCHING");
        assert!(json.get("evidence").is_none());
        assert_eq!(result.to_string(), "UNKNOWN (NON_INTERSECTING, NON_MATCHING)");
    }
}
