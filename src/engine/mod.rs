//! Route validation orchestrator.
//!
//! `RouteValidator` runs SLURM assertions, then SLURM filters, then ROAs, and
//! returns the first verdict produced. It holds no mutable state: each call
//! performs read-only lookups against the stores it was built with, so a
//! validator can be cloned and shared across threads freely.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::asn::Asn;
use crate::config::ValidatorConfig;
use crate::error::{RpkiError, RpkiResult};
use crate::prefix::Prefix;
use crate::resolver::{resolve_assertions, resolve_filters, resolve_roas};
use crate::storage::{RoaStore, SlurmStore, StorageError};
use crate::verdict::ValidationResult;

/// RPKI route origin validator with a SLURM override layer.
#[derive(Clone)]
pub struct RouteValidator {
    roas: Arc<dyn RoaStore>,
    slurm: Arc<dyn SlurmStore>,
    config: ValidatorConfig,
}

impl RouteValidator {
    /// Create a validator with the default configuration.
    #[must_use]
    pub fn new(roas: Arc<dyn RoaStore>, slurm: Arc<dyn SlurmStore>) -> Self {
        Self::with_config(roas, slurm, ValidatorConfig::default())
    }

    /// Create a validator with an explicit configuration.
    #[must_use]
    pub fn with_config(
        roas: Arc<dyn RoaStore>,
        slurm: Arc<dyn SlurmStore>,
        config: ValidatorConfig,
    ) -> Self {
        Self {
            roas,
            slurm,
            config,
        }
    }

    /// The configuration this validator was built with.
    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Get a reference to the ROA store.
    #[must_use]
    pub fn roa_store(&self) -> &Arc<dyn RoaStore> {
        &self.roas
    }

    /// Get a reference to the SLURM store.
    #[must_use]
    pub fn slurm_store(&self) -> &Arc<dyn SlurmStore> {
        &self.slurm
    }

    /// Validate an announcement of `prefix` originated by `asn`.
    ///
    /// Precedence: a matching assertion decides outright; otherwise a matching
    /// filter yields `Unknown`; otherwise ROAs decide, falling back to
    /// `Unknown` / `NonIntersecting`.
    ///
    /// # Errors
    /// Returns `RpkiError::StorageUnavailable` if any lookup fails. The
    /// failure is propagated as-is and never retried here.
    #[tracing::instrument(level = "debug", skip_all, fields(asn = %asn, prefix = %prefix))]
    pub fn validate(&self, asn: Asn, prefix: &Prefix) -> RpkiResult<ValidationResult> {
        let result = self.resolve(asn, prefix).map_err(|e| {
            warn!(error = %e, "storage lookup failed");
            RpkiError::from(e)
        })?;
        debug!(verdict = %result, "validated");
        Ok(result)
    }

    /// Validate raw input: an ASN wider than 32 bits or an address/length pair
    /// that does not form a prefix is rejected before any lookup.
    ///
    /// # Errors
    /// Returns `RpkiError::MalformedInput` for invalid input, or
    /// `RpkiError::StorageUnavailable` if a lookup fails.
    pub fn validate_raw(&self, asn: u64, address: &[u8], length: u8) -> RpkiResult<ValidationResult> {
        let asn = Asn::try_from(asn)?;
        let prefix = Prefix::new(address, length)?;
        self.validate(asn, &prefix)
    }

    /// Validate textual input such as `("AS65001", "10.0.0.0/24")`.
    ///
    /// # Errors
    /// Same as [`RouteValidator::validate_raw`].
    pub fn validate_str(&self, asn: &str, prefix: &str) -> RpkiResult<ValidationResult> {
        let asn: Asn = asn.parse()?;
        let prefix: Prefix = prefix.parse()?;
        self.validate(asn, &prefix)
    }

    fn resolve(&self, asn: Asn, prefix: &Prefix) -> Result<ValidationResult, StorageError> {
        if self.config.apply_assertions {
            if let Some(result) = resolve_assertions(self.slurm.as_ref(), asn, prefix)? {
                return Ok(result);
            }
        }
        if self.config.apply_filters {
            if let Some(result) = resolve_filters(self.slurm.as_ref(), asn, prefix)? {
                return Ok(result);
            }
        }
        resolve_roas(self.roas.as_ref(), asn, prefix)
    }
}

impl std::fmt::Debug for RouteValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteValidator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    use crate::error::ValidationError;
    use crate::roa::Roa;
    use crate::slurm::{SlurmAssertion, SlurmFilter};
    use crate::storage::{InMemoryRoaStore, InMemorySlurmStore, SlurmStore};
    use crate::verdict::{AsState, PrefixState, ValidityState};

    fn p(s: &str) -> Prefix {
        s.parse().unwrap()
    }

    fn validator() -> (RouteValidator, Arc<InMemoryRoaStore>, Arc<InMemorySlurmStore>) {
        let roas = Arc::new(InMemoryRoaStore::new());
        let slurm = Arc::new(InMemorySlurmStore::new());
        let v = RouteValidator::new(roas.clone(), slurm.clone());
        (v, roas, slurm)
    }

    /// ROA store that counts lookups and can be told to fail.
    #[derive(Default)]
    struct ProbeStore {
        calls: AtomicUsize,
        fail: bool,
    }

    impl ProbeStore {
        fn hit(&self) -> Result<(), StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(StorageError::Unavailable("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl RoaStore for ProbeStore {
        fn find_exact_matches(&self, _: &Prefix) -> Result<Vec<Roa>, StorageError> {
            self.hit().map(|()| Vec::new())
        }

        fn find_covering_candidates(&self, _: &Prefix) -> Result<Vec<Roa>, StorageError> {
            self.hit().map(|()| Vec::new())
        }

        fn find_more_specific_candidates(&self, _: &Prefix) -> Result<Vec<Roa>, StorageError> {
            self.hit().map(|()| Vec::new())
        }

        fn exists_for_asn(&self, _: Asn) -> Result<bool, StorageError> {
            self.hit().map(|()| false)
        }
    }

    /// SLURM store whose every lookup times out.
    #[derive(Default)]
    struct StalledSlurm {
        calls: AtomicUsize,
    }

    impl StalledSlurm {
        fn hit<T>(&self) -> Result<T, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Timeout { duration_ms: 250 })
        }
    }

    impl SlurmStore for StalledSlurm {
        fn find_exact_assertions(&self, _: &Prefix) -> Result<Vec<SlurmAssertion>, StorageError> {
            self.hit()
        }

        fn find_covering_assertion_candidates(
            &self,
            _: &Prefix,
        ) -> Result<Vec<SlurmAssertion>, StorageError> {
            self.hit()
        }

        fn find_more_specific_assertion_candidates(
            &self,
            _: &Prefix,
        ) -> Result<Vec<SlurmAssertion>, StorageError> {
            self.hit()
        }

        fn find_matching_filters(&self, _: Asn, _: &Prefix) -> Result<Vec<SlurmFilter>, StorageError> {
            self.hit()
        }
    }

    #[test]
    fn assertion_overrides_filter_and_roa() {
        let (v, roas, slurm) = validator();
        roas.insert(Roa::exact(Asn::new(65002), p("10.0.0.0/24"))).unwrap();
        slurm
            .add_filter(SlurmFilter::new(Some(Asn::new(65001)), None).unwrap())
            .unwrap();
        slurm
            .add_assertion(SlurmAssertion::new(Some(Asn::new(65001)), p("10.0.0.0/24"), None).unwrap())
            .unwrap();

        let r = v.validate(Asn::new(65001), &p("10.0.0.0/24")).unwrap();
        assert_eq!(r.states(), (ValidityState::Valid, PrefixState::Match, AsState::Matching));
        assert!(r.matched_assertion().is_some());
    }

    #[test]
    fn filter_overrides_roa() {
        let (v, roas, slurm) = validator();
        roas.insert(Roa::exact(Asn::new(65001), p("10.0.0.0/24"))).unwrap();
        assert!(v.validate(Asn::new(65001), &p("10.0.0.0/24")).unwrap().is_valid());

        slurm
            .add_filter(SlurmFilter::new(None, Some(p("10.0.0.0/16"))).unwrap())
            .unwrap();
        let r = v.validate(Asn::new(65001), &p("10.0.0.0/24")).unwrap();
        assert_eq!(
            r.states(),
            (ValidityState::Unknown, PrefixState::NonIntersecting, AsState::NonMatching)
        );
        assert!(r.matched_filter().is_some());
    }

    #[test]
    fn disabled_layers_are_skipped() {
        let roas = Arc::new(InMemoryRoaStore::new());
        let slurm = Arc::new(InMemorySlurmStore::new());
        roas.insert(Roa::exact(Asn::new(65001), p("10.0.0.0/24"))).unwrap();
        slurm
            .add_assertion(SlurmAssertion::new(Some(Asn::new(65009)), p("10.0.0.0/24"), None).unwrap())
            .unwrap();
        slurm
            .add_filter(SlurmFilter::new(Some(Asn::new(65001)), None).unwrap())
            .unwrap();

        let v = RouteValidator::with_config(roas.clone(), slurm.clone(), ValidatorConfig::rpki_only());
        let r = v.validate(Asn::new(65001), &p("10.0.0.0/24")).unwrap();
        assert!(r.is_valid());
        assert!(r.matched_roa().is_some());

        let config = ValidatorConfig {
            apply_assertions: false,
            apply_filters: true,
        };
        let v = RouteValidator::with_config(roas, slurm, config);
        let r = v.validate(Asn::new(65001), &p("10.0.0.0/24")).unwrap();
        assert!(r.matched_filter().is_some());
    }

    #[test]
    fn malformed_input_is_rejected_before_any_lookup() {
        let probe = Arc::new(ProbeStore::default());
        let v = RouteValidator::new(probe.clone(), Arc::new(InMemorySlurmStore::new()));

        let err = v.validate_raw(1 << 32, &[10, 0, 0, 0], 8).unwrap_err();
        assert!(matches!(
            err,
            RpkiError::MalformedInput(ValidationError::AsnOutOfRange { .. })
        ));
        let err = v.validate_raw(65001, &[10, 0, 0], 8).unwrap_err();
        assert!(err.is_malformed_input());
        let err = v.validate_raw(65001, &[10, 0, 0, 0], 40).unwrap_err();
        assert!(err.is_malformed_input());
        let err = v.validate_str("AS65001", "10.0.0.1/24").unwrap_err();
        assert!(err.is_malformed_input());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);

        v.validate_raw(65001, &[10, 0, 0, 0], 8).unwrap();
        assert_eq!(probe.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn storage_failure_propagates() {
        let probe = Arc::new(ProbeStore {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let v = RouteValidator::new(probe.clone(), Arc::new(InMemorySlurmStore::new()));
        let err = v.validate(Asn::new(65001), &p("10.0.0.0/24")).unwrap_err();
        assert!(err.is_storage());
        assert!(err.is_retryable());
        // The first failing lookup ends the call; nothing is retried.
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn slurm_failure_ends_the_call_before_roa_lookups() {
        let roas = Arc::new(ProbeStore::default());
        let slurm = Arc::new(StalledSlurm::default());
        let v = RouteValidator::new(roas.clone(), slurm.clone());

        let err = v.validate(Asn::new(65001), &p("10.0.0.0/24")).unwrap_err();
        assert!(matches!(
            err,
            RpkiError::StorageUnavailable(StorageError::Timeout { duration_ms: 250 })
        ));
        assert!(err.is_retryable());
        assert_eq!(slurm.calls.load(Ordering::SeqCst), 1);
        assert_eq!(roas.calls.load(Ordering::SeqCst), 0);

        // With assertions off, the filter lookup is the one that fails.
        let config = ValidatorConfig {
            apply_assertions: false,
            apply_filters: true,
        };
        let v = RouteValidator::with_config(roas.clone(), slurm.clone(), config);
        assert!(v.validate(Asn::new(65001), &p("10.0.0.0/24")).unwrap_err().is_storage());
        assert_eq!(slurm.calls.load(Ordering::SeqCst), 2);
        assert_eq!(roas.calls.load(Ordering::SeqCst), 0);
    }
}
