// view.rs — The read interface other components consume.
//
// The executor never holds a registry directly. It holds a registry address
// and resolves it through a `RegistryLookup` on every batch, so swapping the
// pointer takes effect on the next call.

use std::collections::{BTreeMap, HashMap};

use alloy_primitives::{Address, Selector};

/// Read-only registry queries used during batch validation.
pub trait WhitelistView {
    fn is_whitelisted(&self, target: Address, selector: Selector) -> bool;

    fn is_active_target(&self, target: Address) -> bool;

    fn is_transfer_authorized(&self, token: Address, recipient: Address, wallet: Address) -> bool;
}

/// Resolves a registry address to a deployed registry.
pub trait RegistryLookup {
    fn registry_at(&self, address: Address) -> Option<&dyn WhitelistView>;
}

impl<V: WhitelistView> RegistryLookup for HashMap<Address, V> {
    fn registry_at(&self, address: Address) -> Option<&dyn WhitelistView> {
        self.get(&address).map(|view| view as &dyn WhitelistView)
    }
}

impl<V: WhitelistView> RegistryLookup for BTreeMap<Address, V> {
    fn registry_at(&self, address: Address) -> Option<&dyn WhitelistView> {
        self.get(&address).map(|view| view as &dyn WhitelistView)
    }
}
