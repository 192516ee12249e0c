//! Local SLURM overrides (RFC 8416).
//!
//! Assertions act as locally trusted ROAs; filters withhold validity from
//! matching announcements without ever asserting it.

use serde::{Deserialize, Serialize};

use crate::asn::Asn;
use crate::error::ValidationError;
use crate::prefix::{end_of_range, Prefix};

/// A locally configured prefix assertion, treated as an authoritative ROA.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AssertionRecord", into = "AssertionRecord")]
pub struct SlurmAssertion {
    asn: Option<Asn>,
    ski: Option<String>,
    prefix: Prefix,
    max_length: Option<u8>,
    comment: Option<String>,
    end_prefix: Prefix,
}

impl SlurmAssertion {
    /// Creates an assertion.
    ///
    /// # Errors
    /// Returns `MaxLengthOutOfRange` if `max_length` is present and not within
    /// `[prefix.length(), family width]`.
    pub fn new(
        asn: Option<Asn>,
        prefix: Prefix,
        max_length: Option<u8>,
    ) -> Result<Self, ValidationError> {
        if let Some(max_length) = max_length {
            let width = prefix.family().width();
            if max_length < prefix.length() || max_length > width {
                return Err(ValidationError::MaxLengthOutOfRange {
                    max_length,
                    length: prefix.length(),
                    width,
                });
            }
        }
        Ok(Self {
            asn,
            ski: None,
            prefix,
            max_length,
            comment: None,
            end_prefix: end_of_range(&prefix, max_length),
        })
    }

    /// Sets the subject key identifier.
    #[must_use]
    pub fn with_ski(mut self, ski: impl Into<String>) -> Self {
        self.ski = Some(ski.into());
        self
    }

    /// Sets the free-text comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Asserted origin, if any.
    #[must_use]
    pub const fn asn(&self) -> Option<Asn> {
        self.asn
    }

    /// Subject key identifier. Not used for prefix validation.
    #[must_use]
    pub fn ski(&self) -> Option<&str> {
        self.ski.as_deref()
    }

    /// Asserted prefix.
    #[must_use]
    pub const fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// Length of the asserted prefix.
    #[must_use]
    pub const fn prefix_length(&self) -> u8 {
        self.prefix.length()
    }

    /// Optional max length.
    #[must_use]
    pub const fn max_length(&self) -> Option<u8> {
        self.max_length
    }

    /// Free-text comment.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Highest sub-prefix reachable within the max length.
    #[must_use]
    pub const fn end_prefix(&self) -> &Prefix {
        &self.end_prefix
    }

    /// Returns true if both assertions describe the same record, ignoring the
    /// comment.
    #[must_use]
    pub fn same_record(&self, other: &Self) -> bool {
        self.asn == other.asn
            && self.ski == other.ski
            && self.prefix == other.prefix
            && self.max_length == other.max_length
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssertionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    asn: Option<Asn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ski: Option<String>,
    prefix: Prefix,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_prefix_length: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl TryFrom<AssertionRecord> for SlurmAssertion {
    type Error = ValidationError;

    fn try_from(record: AssertionRecord) -> Result<Self, Self::Error> {
        let mut assertion = Self::new(record.asn, record.prefix, record.max_prefix_length)?;
        assertion.ski = record.ski;
        assertion.comment = record.comment;
        Ok(assertion)
    }
}

impl From<SlurmAssertion> for AssertionRecord {
    fn from(assertion: SlurmAssertion) -> Self {
        Self {
            asn: assertion.asn,
            ski: assertion.ski,
            prefix: assertion.prefix,
            max_prefix_length: assertion.max_length,
            comment: assertion.comment,
        }
    }
}

/// A locally configured filter: "ignore ROAs matching this shape".
///
/// Absent fields are wildcards; at least one of ASN or prefix is present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FilterRecord", into = "FilterRecord")]
pub struct SlurmFilter {
    asn: Option<Asn>,
    prefix: Option<Prefix>,
    comment: Option<String>,
}

impl SlurmFilter {
    /// Creates a filter.
    ///
    /// # Errors
    /// Returns `EmptyFilter` when both `asn` and `prefix` are absent.
    pub fn new(asn: Option<Asn>, prefix: Option<Prefix>) -> Result<Self, ValidationError> {
        if asn.is_none() && prefix.is_none() {
            return Err(ValidationError::EmptyFilter);
        }
        Ok(Self {
            asn,
            prefix,
            comment: None,
        })
    }

    /// Sets the free-text comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Filtered origin, if any.
    #[must_use]
    pub const fn asn(&self) -> Option<Asn> {
        self.asn
    }

    /// Filtered prefix, if any.
    #[must_use]
    pub const fn prefix(&self) -> Option<&Prefix> {
        self.prefix.as_ref()
    }

    /// Free-text comment.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns true if this filter applies to an announcement of `target` by
    /// `asn`.
    ///
    /// The prefix (when present) must contain or be contained by `target`, and
    /// the ASN (when present) must equal `asn`.
    #[must_use]
    pub fn matches(&self, asn: Asn, target: &Prefix) -> bool {
        let prefix_ok = self.prefix.map_or(true, |p| p.intersects(target));
        let asn_ok = self.asn.map_or(true, |a| a == asn);
        prefix_ok && asn_ok
    }

    /// Returns true if both filters describe the same record, ignoring the
    /// comment.
    #[must_use]
    pub fn same_record(&self, other: &Self) -> bool {
        self.asn == other.asn && self.prefix == other.prefix
    }
}

#[derive(Serialize, Deserialize)]
struct FilterRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    asn: Option<Asn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prefix: Option<Prefix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl TryFrom<FilterRecord> for SlurmFilter {
    type Error = ValidationError;

    fn try_from(record: FilterRecord) -> Result<Self, Self::Error> {
        let mut filter = Self::new(record.asn, record.prefix)?;
        filter.comment = record.comment;
        Ok(filter)
    }
}

impl From<SlurmFilter> for FilterRecord {
    fn from(filter: SlurmFilter) -> Self {
        Self {
            asn: filter.asn,
            prefix: filter.prefix,
            comment: filter.comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Prefix {
        s.parse().unwrap()
    }

    #[test]
    fn assertion_max_length_is_optional_but_bounded() {
        let a = SlurmAssertion::new(Some(Asn::new(65001)), p("10.0.0.0/24"), None).unwrap();
        assert_eq!(*a.end_prefix(), p("10.0.0.0/24"));

        let a = SlurmAssertion::new(Some(Asn::new(65001)), p("10.0.0.0/22"), Some(24)).unwrap();
        assert_eq!(*a.end_prefix(), p("10.0.3.0/24"));

        assert!(matches!(
            SlurmAssertion::new(Some(Asn::new(65001)), p("10.0.0.0/24"), Some(23)),
            Err(ValidationError::MaxLengthOutOfRange { .. })
        ));
    }

    #[test]
    fn assertion_serde_uses_rfc8416_field_names() {
        let a = SlurmAssertion::new(Some(Asn::new(64496)), p("198.51.100.0/24"), Some(24))
            .unwrap()
            .with_comment("My other important route");
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["asn"], 64496);
        assert_eq!(json["prefix"], "198.51.100.0/24");
        assert_eq!(json["maxPrefixLength"], 24);
        assert_eq!(json["comment"], "My other important route");

        let back: SlurmAssertion = serde_json::from_value(json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn filter_requires_asn_or_prefix() {
        assert_eq!(SlurmFilter::new(None, None), Err(ValidationError::EmptyFilter));
        assert!(serde_json::from_str::<SlurmFilter>(r#"{"comment":"all"}"#).is_err());
        assert!(SlurmFilter::new(Some(Asn::new(64496)), None).is_ok());
        assert!(SlurmFilter::new(None, Some(p("10.0.0.0/8"))).is_ok());
    }

    #[test]
    fn filter_matching_uses_wildcards() {
        let by_asn = SlurmFilter::new(Some(Asn::new(65001)), None).unwrap();
        assert!(by_asn.matches(Asn::new(65001), &p("203.0.113.0/24")));
        assert!(!by_asn.matches(Asn::new(65002), &p("203.0.113.0/24")));

        let by_prefix = SlurmFilter::new(None, Some(p("10.0.0.0/16"))).unwrap();
        assert!(by_prefix.matches(Asn::new(1), &p("10.0.1.0/24")));
        assert!(by_prefix.matches(Asn::new(1), &p("10.0.0.0/8")));
        assert!(!by_prefix.matches(Asn::new(1), &p("10.1.0.0/24")));

        let both = SlurmFilter::new(Some(Asn::new(65001)), Some(p("10.0.0.0/16"))).unwrap();
        assert!(both.matches(Asn::new(65001), &p("10.0.0.0/24")));
        assert!(!both.matches(Asn::new(65002), &p("10.0.0.0/24")));
        assert!(!both.matches(Asn::new(65001), &p("192.0.2.0/24")));
    }
}
