// allowlist.rs — The (target, selector) allow-list.
//
// Entries are grouped per target. A target's selector set is dropped as soon
// as it becomes empty, so "active target" and "selector count > 0" are the
// same fact and cannot drift apart.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, Selector};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Whitelisted (target, selector) pairs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AllowList {
    entries: BTreeMap<Address, BTreeSet<Selector>>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair. Fails with `AlreadyPresent` if it is already listed.
    pub fn add(&mut self, target: Address, selector: Selector) -> Result<(), RegistryError> {
        if !self.entries.entry(target).or_default().insert(selector) {
            return Err(RegistryError::AlreadyPresent { target, selector });
        }
        Ok(())
    }

    /// Remove a pair. Fails with `NotPresent` if it is not listed.
    pub fn remove(&mut self, target: Address, selector: Selector) -> Result<(), RegistryError> {
        let Some(selectors) = self.entries.get_mut(&target) else {
            return Err(RegistryError::NotPresent { target, selector });
        };
        if !selectors.remove(&selector) {
            return Err(RegistryError::NotPresent { target, selector });
        }
        if selectors.is_empty() {
            self.entries.remove(&target);
        }
        Ok(())
    }

    pub fn contains(&self, target: Address, selector: Selector) -> bool {
        self.entries
            .get(&target)
            .is_some_and(|selectors| selectors.contains(&selector))
    }

    /// Number of whitelisted selectors for `target`.
    pub fn selector_count(&self, target: Address) -> usize {
        self.entries.get(&target).map_or(0, BTreeSet::len)
    }

    /// A target is active while it has at least one whitelisted selector.
    pub fn is_active(&self, target: Address) -> bool {
        self.entries.contains_key(&target)
    }

    pub fn active_target_count(&self) -> usize {
        self.entries.len()
    }

    /// Whitelisted selectors of `target`, in ascending order.
    pub fn selectors(&self, target: Address) -> Vec<Selector> {
        self.entries
            .get(&target)
            .map(|selectors| selectors.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Active targets, in ascending order.
    pub fn targets(&self) -> impl Iterator<Item = Address> + '_ {
        self.entries.keys().copied()
    }
}

/// Check the shape of a batched (targets, selectors) argument and zip it.
///
/// Rejects empty batches, mismatched lengths, zero targets and zero
/// selectors. Duplicates are left to the caller, which rejects them when the
/// second copy is applied.
pub fn validate_pairs(
    targets: &[Address],
    selectors: &[Selector],
) -> Result<Vec<(Address, Selector)>, RegistryError> {
    if targets.is_empty() {
        return Err(RegistryError::EmptyBatch);
    }
    if targets.len() != selectors.len() {
        return Err(RegistryError::LengthMismatch {
            targets: targets.len(),
            selectors: selectors.len(),
        });
    }

    targets
        .iter()
        .zip(selectors)
        .enumerate()
        .map(|(index, (&target, &selector))| {
            if target.is_zero() {
                return Err(RegistryError::InvalidTarget { index });
            }
            if selector == Selector::ZERO {
                return Err(RegistryError::InvalidSelector { index });
            }
            Ok((target, selector))
        })
        .collect()
}
