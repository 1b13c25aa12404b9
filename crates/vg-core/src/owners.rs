// owners.rs — The wallet-owner query capability.
//
// Custodial wallets answer "who owns you?" in one of two shapes: a direct
// single-address check, or an enumeration of every owner. The engine depends
// only on the single-address form; `EnumeratedOwners` adapts the other shape.
//
// Failures are reported as `OwnerQueryError` so the caller can decide how to
// treat them. The registry downgrades every failure to "not an owner".

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::Address;

use crate::error::OwnerQueryError;

/// "Is `candidate` an owner of `wallet`?"
pub trait WalletOwnerQuery: Send + Sync {
    fn is_owner(&self, wallet: Address, candidate: Address) -> Result<bool, OwnerQueryError>;
}

/// The enumerate-all shape of the owner query.
pub trait OwnerEnumeration: Send + Sync {
    fn owners(&self, wallet: Address) -> Result<Vec<Address>, OwnerQueryError>;
}

/// Adapts an [`OwnerEnumeration`] into a [`WalletOwnerQuery`] by scanning
/// the returned owner list.
#[derive(Debug, Clone, Default)]
pub struct EnumeratedOwners<E>(pub E);

impl<E: OwnerEnumeration> WalletOwnerQuery for EnumeratedOwners<E> {
    fn is_owner(&self, wallet: Address, candidate: Address) -> Result<bool, OwnerQueryError> {
        Ok(self.0.owners(wallet)?.contains(&candidate))
    }
}

/// A fixed owner table, keyed by wallet.
///
/// Wallets absent from the table behave like contracts without an owner
/// query: they report `Unavailable`.
#[derive(Debug, Clone, Default)]
pub struct StaticOwners {
    wallets: BTreeMap<Address, BTreeSet<Address>>,
}

impl StaticOwners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `owners` for `wallet` (builder pattern).
    pub fn with_wallet(mut self, wallet: Address, owners: impl IntoIterator<Item = Address>) -> Self {
        self.wallets.entry(wallet).or_default().extend(owners);
        self
    }
}

impl OwnerEnumeration for StaticOwners {
    fn owners(&self, wallet: Address) -> Result<Vec<Address>, OwnerQueryError> {
        self.wallets
            .get(&wallet)
            .map(|owners| owners.iter().copied().collect())
            .ok_or(OwnerQueryError::Unavailable { wallet })
    }
}

impl WalletOwnerQuery for StaticOwners {
    fn is_owner(&self, wallet: Address, candidate: Address) -> Result<bool, OwnerQueryError> {
        self.wallets
            .get(&wallet)
            .map(|owners| owners.contains(&candidate))
            .ok_or(OwnerQueryError::Unavailable { wallet })
    }
}

/// An owner query that is never reachable. Used when no wallet integration
/// is configured; every lookup fails and is therefore "not an owner".
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableOwnerQuery;

impl WalletOwnerQuery for UnavailableOwnerQuery {
    fn is_owner(&self, wallet: Address, _candidate: Address) -> Result<bool, OwnerQueryError> {
        Err(OwnerQueryError::Unavailable { wallet })
    }
}
