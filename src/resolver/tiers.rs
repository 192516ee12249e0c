use std::cmp::Reverse;
use std::fmt;

use tracing::trace;

use crate::asn::Asn;
use crate::prefix::{contained_in, Prefix};
use crate::roa::Roa;
use crate::slurm::SlurmAssertion;
use crate::storage::{RoaStore, SlurmStore, StorageError};
use crate::verdict::{AsState, PrefixState, ValidityState};

/// A record that authorizes an origin for a prefix.
pub trait OriginRecord: Clone {
    /// Authorized origin, if the record names one.
    fn origin(&self) -> Option<Asn>;

    /// Authorized prefix.
    fn prefix(&self) -> &Prefix;

    /// Max length, if the record carries one.
    fn max_length(&self) -> Option<u8>;

    /// Key identifier and comment. They never affect a verdict; they only
    /// order records that agree on every other field.
    fn annotations(&self) -> (Option<&str>, Option<&str>) {
        (None, None)
    }

    /// Whether a strictly covering record authorizes `target` outright.
    ///
    /// When true the covering tier yields `Match` with origin-dependent
    /// validity; otherwise it yields `MoreSpecific` / `Invalid`.
    fn admits(&self, target: &Prefix) -> bool;
}

impl OriginRecord for Roa {
    fn origin(&self) -> Option<Asn> {
        Some(self.asn())
    }

    fn prefix(&self) -> &Prefix {
        Roa::prefix(self)
    }

    fn max_length(&self) -> Option<u8> {
        Some(Roa::max_length(self))
    }

    fn admits(&self, target: &Prefix) -> bool {
        self.authorizes(target)
    }
}

impl OriginRecord for SlurmAssertion {
    fn origin(&self) -> Option<Asn> {
        self.asn()
    }

    fn prefix(&self) -> &Prefix {
        SlurmAssertion::prefix(self)
    }

    fn max_length(&self) -> Option<u8> {
        SlurmAssertion::max_length(self)
    }

    fn annotations(&self) -> (Option<&str>, Option<&str>) {
        (self.ski(), self.comment())
    }

    // A more specific announcement under an assertion is always invalid.
    fn admits(&self, _target: &Prefix) -> bool {
        false
    }
}

/// The three candidate lookups the tier search needs.
pub trait TierLookup {
    /// Record kind returned by the lookups.
    type Record: OriginRecord;

    /// Records at exactly `prefix`.
    fn exact(&self, prefix: &Prefix) -> Result<Vec<Self::Record>, StorageError>;

    /// Records that may strictly cover `prefix`.
    fn covering(&self, prefix: &Prefix) -> Result<Vec<Self::Record>, StorageError>;

    /// Records that may be strictly covered by `prefix`.
    fn more_specific(&self, prefix: &Prefix) -> Result<Vec<Self::Record>, StorageError>;
}

/// ROA lookups as a tier source.
#[derive(Clone, Copy)]
pub struct RoaTiers<'a>(pub &'a dyn RoaStore);

impl TierLookup for RoaTiers<'_> {
    type Record = Roa;

    fn exact(&self, prefix: &Prefix) -> Result<Vec<Roa>, StorageError> {
        self.0.find_exact_matches(prefix)
    }

    fn covering(&self, prefix: &Prefix) -> Result<Vec<Roa>, StorageError> {
        self.0.find_covering_candidates(prefix)
    }

    fn more_specific(&self, prefix: &Prefix) -> Result<Vec<Roa>, StorageError> {
        self.0.find_more_specific_candidates(prefix)
    }
}

/// SLURM assertion lookups as a tier source.
#[derive(Clone, Copy)]
pub struct AssertionTiers<'a>(pub &'a dyn SlurmStore);

impl TierLookup for AssertionTiers<'_> {
    type Record = SlurmAssertion;

    fn exact(&self, prefix: &Prefix) -> Result<Vec<SlurmAssertion>, StorageError> {
        self.0.find_exact_assertions(prefix)
    }

    fn covering(&self, prefix: &Prefix) -> Result<Vec<SlurmAssertion>, StorageError> {
        self.0.find_covering_assertion_candidates(prefix)
    }

    fn more_specific(&self, prefix: &Prefix) -> Result<Vec<SlurmAssertion>, StorageError> {
        self.0.find_more_specific_assertion_candidates(prefix)
    }
}

/// Which tier decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Same prefix and length.
    Exact,
    /// Record is a strict ancestor of the target.
    Covering,
    /// Record is a strict descendant of the target.
    MoreSpecific,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Covering => write!(f, "covering"),
            Self::MoreSpecific => write!(f, "more_specific"),
        }
    }
}

/// Outcome of a successful tier search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierMatch<R> {
    /// Tier that produced the match.
    pub tier: Tier,
    /// Validity facet.
    pub validity: ValidityState,
    /// Prefix facet.
    pub prefix_state: PrefixState,
    /// Origin facet.
    pub as_state: AsState,
    /// The deciding record.
    pub record: R,
}

/// Storage-order-free tie breaker: a total order over every record field.
fn canonical<R: OriginRecord>(
    record: &R,
) -> (Prefix, Option<Asn>, Option<u8>, (Option<&str>, Option<&str>)) {
    (
        *record.prefix(),
        record.origin(),
        record.max_length(),
        record.annotations(),
    )
}

/// Runs the exact / covering / more-specific search for `asn` announcing
/// `target`. The first tier with a qualifying record decides.
///
/// Within a tier the record is chosen by rank, never by storage order:
/// - exact: a record with the queried origin wins;
/// - covering: a record admitting the target with the queried origin, then
///   any admitting record, then the most specific ancestor;
/// - more specific: a record with the queried origin wins.
///
/// Remaining ties fall back to (prefix, origin, max length, key identifier,
/// comment).
///
/// Returns `Ok(None)` when no tier qualifies.
pub fn search_tiers<L>(
    lookup: &L,
    asn: Asn,
    target: &Prefix,
) -> Result<Option<TierMatch<L::Record>>, StorageError>
where
    L: TierLookup + ?Sized,
{
    let is_origin = |r: &L::Record| r.origin() == Some(asn);

    let exact = lookup.exact(target)?;
    trace!(candidates = exact.len(), "exact lookup");
    let best = exact
        .into_iter()
        .filter(|r| r.prefix() == target)
        .min_by(|a, b| (!is_origin(a), canonical(a)).cmp(&(!is_origin(b), canonical(b))));
    if let Some(record) = best {
        let matching = is_origin(&record);
        return Ok(Some(TierMatch {
            tier: Tier::Exact,
            validity: if matching {
                ValidityState::Valid
            } else {
                ValidityState::Invalid
            },
            prefix_state: PrefixState::Match,
            as_state: AsState::from_match(matching),
            record,
        }));
    }

    let covering = lookup.covering(target)?;
    trace!(candidates = covering.len(), "covering lookup");
    let best = covering
        .into_iter()
        .filter(|r| r.prefix().length() < target.length() && contained_in(target, r.prefix()))
        .min_by(|a, b| {
            let rank = |r: &L::Record| {
                let admits = r.admits(target);
                (
                    !(admits && is_origin(r)),
                    !admits,
                    Reverse(r.prefix().length()),
                )
            };
            rank(a)
                .cmp(&rank(b))
                .then_with(|| canonical(a).cmp(&canonical(b)))
        });
    if let Some(record) = best {
        let matching = is_origin(&record);
        let (validity, prefix_state) = if record.admits(target) {
            let validity = if matching {
                ValidityState::Valid
            } else {
                ValidityState::Invalid
            };
            (validity, PrefixState::Match)
        } else {
            (ValidityState::Invalid, PrefixState::MoreSpecific)
        };
        return Ok(Some(TierMatch {
            tier: Tier::Covering,
            validity,
            prefix_state,
            as_state: AsState::from_match(matching),
            record,
        }));
    }

    let more_specific = lookup.more_specific(target)?;
    trace!(candidates = more_specific.len(), "more-specific lookup");
    let best = more_specific
        .into_iter()
        .filter(|r| r.prefix().length() > target.length() && contained_in(r.prefix(), target))
        .min_by(|a, b| (!is_origin(a), canonical(a)).cmp(&(!is_origin(b), canonical(b))));
    if let Some(record) = best {
        let matching = is_origin(&record);
        return Ok(Some(TierMatch {
            tier: Tier::MoreSpecific,
            validity: ValidityState::Unknown,
            prefix_state: PrefixState::CoveringAggregate,
            as_state: AsState::from_match(matching),
            record,
        }));
    }

    Ok(None)
}
