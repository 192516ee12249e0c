//! Verdict resolution.
//!
//! The exact / covering / more-specific search is written once in `tiers` and
//! shared by SLURM assertions and ROAs; `overlay` adds the filter pass and
//! `roa` the RFC 6483 "not found" fallback.

mod overlay;
mod roa;
mod tiers;

pub use overlay::{resolve_assertions, resolve_filters};
pub use roa::resolve_roas;
pub use tiers::{search_tiers, AssertionTiers, OriginRecord, RoaTiers, Tier, TierLookup, TierMatch};
