//! SLURM overlay: assertions first, then filters.

use tracing::{debug, trace};

use crate::asn::Asn;
use crate::prefix::Prefix;
use crate::resolver::tiers::{search_tiers, AssertionTiers};
use crate::slurm::SlurmFilter;
use crate::storage::{SlurmStore, StorageError};
use crate::verdict::{AsState, Evidence, PrefixState, ValidationResult, ValidityState};

/// Resolves `asn` announcing `target` against SLURM assertions.
///
/// Returns `Ok(None)` when no assertion applies. Assertions never produce a
/// terminal "not found" verdict; the caller moves on to filters and ROAs.
pub fn resolve_assertions(
    store: &dyn SlurmStore,
    asn: Asn,
    target: &Prefix,
) -> Result<Option<ValidationResult>, StorageError> {
    let Some(hit) = search_tiers(&AssertionTiers(store), asn, target)? else {
        return Ok(None);
    };
    debug!(tier = %hit.tier, validity = %hit.validity, "assertion applies");
    Ok(Some(ValidationResult::new(
        hit.validity,
        hit.prefix_state,
        hit.as_state,
        Some(Evidence::Assertion(hit.record)),
    )))
}

/// Total order over every filter field, so the reported filter never depends
/// on store order.
fn filter_key(filter: &SlurmFilter) -> (Option<Prefix>, Option<Asn>, Option<&str>) {
    (filter.prefix().copied(), filter.asn(), filter.comment())
}

/// Resolves `asn` announcing `target` against SLURM filters.
///
/// A matching filter yields `Unknown` / `NonIntersecting` / `NonMatching`:
/// it withholds validity and never vouches for the origin. Returns
/// `Ok(None)` when no filter applies.
pub fn resolve_filters(
    store: &dyn SlurmStore,
    asn: Asn,
    target: &Prefix,
) -> Result<Option<ValidationResult>, StorageError> {
    let candidates = store.find_matching_filters(asn, target)?;
    trace!(candidates = candidates.len(), "filter lookup");
    let Some(filter) = candidates
        .into_iter()
        .filter(|f| f.matches(asn, target))
        .min_by(|a, b| filter_key(a).cmp(&filter_key(b)))
    else {
        return Ok(None);
    };
    debug!("filter applies");
    Ok(Some(ValidationResult::new(
        ValidityState::Unknown,
        PrefixState::NonIntersecting,
        AsState::NonMatching,
        Some(Evidence::Filter(filter)),
    )))
}
