//! In-memory storage backend.
//!
//! Thread-safe implementations of the lookup traits over ordered maps. Intended
//! for embedded usage, tests, and as a reference implementation.
//!
//! Records are keyed by `Prefix`, whose ordering is (family, address, length).
//! Every strict descendant of a prefix therefore sorts between the prefix
//! itself and its last host address, which turns the more-specific lookup into
//! a single range scan. Ancestors are found by truncating the target to each
//! shorter length.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Bound;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::asn::Asn;
use crate::prefix::Prefix;
use crate::roa::Roa;
use crate::slurm::{SlurmAssertion, SlurmFilter};
use crate::storage::traits::{RoaStore, SlurmStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

/// Values stored under every strict ancestor of `prefix`.
fn ancestors<'a, V>(index: &'a BTreeMap<Prefix, Vec<V>>, prefix: &Prefix) -> Vec<&'a V> {
    (0..prefix.length())
        .filter_map(|len| prefix.truncate(len))
        .filter_map(|ancestor| index.get(&ancestor))
        .flatten()
        .collect()
}

/// Values stored under every strict descendant of `prefix`.
fn descendants<'a, V>(index: &'a BTreeMap<Prefix, Vec<V>>, prefix: &Prefix) -> Vec<&'a V> {
    let end = prefix.last_address();
    index
        .range((Bound::Excluded(*prefix), Bound::Included(end)))
        .filter(|(key, _)| key.length() > prefix.length())
        .flat_map(|(_, values)| values)
        .collect()
}

#[derive(Debug, Default)]
struct RoaState {
    by_prefix: BTreeMap<Prefix, Vec<Roa>>,
    by_asn: HashMap<Asn, usize>,
    len: usize,
}

/// In-memory ROA store.
#[derive(Debug, Default)]
pub struct InMemoryRoaStore {
    state: RwLock<RoaState>,
}

impl InMemoryRoaStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `roas`.
    ///
    /// # Errors
    /// Returns `DuplicateKey` if the same ROA appears twice.
    pub fn from_roas(roas: impl IntoIterator<Item = Roa>) -> Result<Self, StorageError> {
        let store = Self::new();
        for roa in roas {
            store.insert(roa)?;
        }
        Ok(store)
    }

    /// Inserts a ROA. Returns `DuplicateKey` if an identical ROA is present.
    pub fn insert(&self, roa: Roa) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("roa insert"))?;
        let bucket = state.by_prefix.entry(*roa.prefix()).or_default();
        if bucket.contains(&roa) {
            return Err(StorageError::DuplicateKey(roa.to_string()));
        }
        let asn = roa.asn();
        bucket.push(roa);
        *state.by_asn.entry(asn).or_default() += 1;
        state.len += 1;
        Ok(())
    }

    /// Removes a ROA. Returns `NotFound` if it is not present.
    pub fn remove(&self, roa: &Roa) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("roa remove"))?;
        let Some(bucket) = state.by_prefix.get_mut(roa.prefix()) else {
            return Err(StorageError::NotFound(roa.to_string()));
        };
        let Some(pos) = bucket.iter().position(|r| r == roa) else {
            return Err(StorageError::NotFound(roa.to_string()));
        };
        bucket.swap_remove(pos);
        if bucket.is_empty() {
            state.by_prefix.remove(roa.prefix());
        }
        if let Some(count) = state.by_asn.get_mut(&roa.asn()) {
            *count -= 1;
            if *count == 0 {
                state.by_asn.remove(&roa.asn());
            }
        }
        state.len -= 1;
        Ok(())
    }

    /// Number of stored ROAs.
    pub fn len(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("roa len"))?;
        Ok(state.len)
    }

    /// Returns true if no ROA is stored.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// Removes every ROA.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("roa clear"))?;
        *state = RoaState::default();
        Ok(())
    }
}

impl RoaStore for InMemoryRoaStore {
    fn find_exact_matches(&self, prefix: &Prefix) -> Result<Vec<Roa>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("roa exact"))?;
        Ok(state.by_prefix.get(prefix).cloned().unwrap_or_default())
    }

    fn find_covering_candidates(&self, prefix: &Prefix) -> Result<Vec<Roa>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("roa covering"))?;
        Ok(ancestors(&state.by_prefix, prefix).into_iter().cloned().collect())
    }

    fn find_more_specific_candidates(&self, prefix: &Prefix) -> Result<Vec<Roa>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("roa more specific"))?;
        Ok(descendants(&state.by_prefix, prefix).into_iter().cloned().collect())
    }

    fn exists_for_asn(&self, asn: Asn) -> Result<bool, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("roa asn"))?;
        Ok(state.by_asn.contains_key(&asn))
    }
}

/// Identifier assigned to a SLURM record on insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlurmRecordId(u64);

impl SlurmRecordId {
    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlurmRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
struct SlurmState {
    next_id: u64,
    assertions: BTreeMap<SlurmRecordId, SlurmAssertion>,
    assertion_index: BTreeMap<Prefix, Vec<SlurmRecordId>>,
    filters: BTreeMap<SlurmRecordId, SlurmFilter>,
}

impl SlurmState {
    fn allocate_id(&mut self) -> SlurmRecordId {
        self.next_id += 1;
        SlurmRecordId(self.next_id)
    }

    fn resolve(&self, ids: Vec<&SlurmRecordId>) -> Vec<SlurmAssertion> {
        ids.into_iter()
            .filter_map(|id| self.assertions.get(id))
            .cloned()
            .collect()
    }
}

/// In-memory SLURM store holding assertions and filters.
#[derive(Debug, Default)]
pub struct InMemorySlurmStore {
    state: RwLock<SlurmState>,
}

impl InMemorySlurmStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assertion and returns its id.
    ///
    /// An assertion equal to a stored one (comment aside) is rejected with
    /// `DuplicateKey`.
    pub fn add_assertion(&self, assertion: SlurmAssertion) -> Result<SlurmRecordId, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("assertion insert"))?;
        let duplicate = state
            .assertion_index
            .get(assertion.prefix())
            .into_iter()
            .flatten()
            .filter_map(|id| state.assertions.get(id))
            .any(|stored| stored.same_record(&assertion));
        if duplicate {
            return Err(StorageError::DuplicateKey(format!(
                "assertion {}",
                assertion.prefix()
            )));
        }

        let id = state.allocate_id();
        state
            .assertion_index
            .entry(*assertion.prefix())
            .or_default()
            .push(id);
        state.assertions.insert(id, assertion);
        Ok(id)
    }

    /// Adds a filter and returns its id.
    ///
    /// A filter equal to a stored one (comment aside) is rejected with
    /// `DuplicateKey`.
    pub fn add_filter(&self, filter: SlurmFilter) -> Result<SlurmRecordId, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("filter insert"))?;
        if state.filters.values().any(|stored| stored.same_record(&filter)) {
            return Err(StorageError::DuplicateKey("filter".to_string()));
        }
        let id = state.allocate_id();
        state.filters.insert(id, filter);
        Ok(id)
    }

    /// Looks up an assertion by id.
    pub fn get_assertion(&self, id: SlurmRecordId) -> Result<Option<SlurmAssertion>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("assertion get"))?;
        Ok(state.assertions.get(&id).cloned())
    }

    /// Looks up a filter by id.
    pub fn get_filter(&self, id: SlurmRecordId) -> Result<Option<SlurmFilter>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("filter get"))?;
        Ok(state.filters.get(&id).cloned())
    }

    /// Removes an assertion or filter by id. Returns `NotFound` if neither
    /// exists.
    pub fn remove(&self, id: SlurmRecordId) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("slurm remove"))?;
        if state.filters.remove(&id).is_some() {
            return Ok(());
        }
        let Some(assertion) = state.assertions.remove(&id) else {
            return Err(StorageError::NotFound(format!("slurm record {id}")));
        };
        if let Some(ids) = state.assertion_index.get_mut(assertion.prefix()) {
            ids.retain(|stored| *stored != id);
            if ids.is_empty() {
                state.assertion_index.remove(assertion.prefix());
            }
        }
        Ok(())
    }

    /// All assertions, ordered by id.
    pub fn assertions(&self) -> Result<Vec<(SlurmRecordId, SlurmAssertion)>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("assertion list"))?;
        Ok(state
            .assertions
            .iter()
            .map(|(id, a)| (*id, a.clone()))
            .collect())
    }

    /// All filters, ordered by id.
    pub fn filters(&self) -> Result<Vec<(SlurmRecordId, SlurmFilter)>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("filter list"))?;
        Ok(state
            .filters
            .iter()
            .map(|(id, f)| (*id, f.clone()))
            .collect())
    }

    /// Removes every assertion and filter. Ids are not reused.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("slurm clear"))?;
        state.assertions.clear();
        state.assertion_index.clear();
        state.filters.clear();
        Ok(())
    }
}

impl SlurmStore for InMemorySlurmStore {
    fn find_exact_assertions(&self, prefix: &Prefix) -> Result<Vec<SlurmAssertion>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("assertion exact"))?;
        let ids = state.assertion_index.get(prefix).into_iter().flatten().collect();
        Ok(state.resolve(ids))
    }

    fn find_covering_assertion_candidates(
        &self,
        prefix: &Prefix,
    ) -> Result<Vec<SlurmAssertion>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("assertion covering"))?;
        let ids = ancestors(&state.assertion_index, prefix);
        Ok(state.resolve(ids))
    }

    fn find_more_specific_assertion_candidates(
        &self,
        prefix: &Prefix,
    ) -> Result<Vec<SlurmAssertion>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("assertion more specific"))?;
        let ids = descendants(&state.assertion_index, prefix);
        Ok(state.resolve(ids))
    }

    fn find_matching_filters(
        &self,
        asn: Asn,
        prefix: &Prefix,
    ) -> Result<Vec<SlurmFilter>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("filter match"))?;
        Ok(state
            .filters
            .values()
            .filter(|f| f.matches(asn, prefix))
            .cloned()
            .collect())
    }
}
