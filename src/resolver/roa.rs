//! ROA resolution with the RFC 6483 "not found" fallback.

use tracing::debug;

use crate::asn::Asn;
use crate::prefix::Prefix;
use crate::resolver::tiers::{search_tiers, RoaTiers};
use crate::storage::{RoaStore, StorageError};
use crate::verdict::{AsState, Evidence, PrefixState, ValidationResult, ValidityState};

/// Resolves `asn` announcing `target` against the ROA store.
///
/// Always produces a verdict. When no tier qualifies the result is
/// `Unknown` / `NonIntersecting`, with `Matching` only if some ROA exists for
/// `asn` elsewhere.
pub fn resolve_roas(
    store: &dyn RoaStore,
    asn: Asn,
    target: &Prefix,
) -> Result<ValidationResult, StorageError> {
    if let Some(hit) = search_tiers(&RoaTiers(store), asn, target)? {
        debug!(tier = %hit.tier, validity = %hit.validity, roa = %hit.record, "ROA applies");
        return Ok(ValidationResult::new(
            hit.validity,
            hit.prefix_state,
            hit.as_state,
            Some(Evidence::Roa(hit.record)),
        ));
    }

    let known_origin = store.exists_for_asn(asn)?;
    debug!(known_origin, "no ROA intersects");
    Ok(ValidationResult::new(
        ValidityState::Unknown,
        PrefixState::NonIntersecting,
        AsState::from_match(known_origin),
        None,
    ))
}
