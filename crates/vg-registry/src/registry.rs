// registry.rs — WhitelistRegistry: the owner-managed allow-list component.
//
// Every mutating call follows the same shape:
//
//   1. clone the current state,
//   2. check access, pause and input, then apply the change to the clone,
//   3. commit the clone to the store,
//   4. swap it in and emit events.
//
// Any error in steps 2-3 drops the clone, so a call either applies in full
// or leaves no trace.

use std::sync::Arc;

use alloy_primitives::{Address, Selector, B256};
use tracing::{debug, info};
use vg_audit::{emit, EventSink, GuardEvent, NullSink};
use vg_core::{Clock, OperationKind, SystemClock, UnavailableOwnerQuery, WalletOwnerQuery};

use crate::allowlist::validate_pairs;
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::governance::PendingOperation;
use crate::recipients::{authorize_transfer, TransferAuthorization};
use crate::state::RegistryState;
use crate::store::{MemoryStore, RegistryStore};
use crate::view::{RegistryLookup, WhitelistView};

/// An allow-list registry deployed at `address`.
pub struct WhitelistRegistry<S: RegistryStore = MemoryStore> {
    address: Address,
    state: RegistryState,
    store: S,
    clock: Arc<dyn Clock>,
    owners: Arc<dyn WalletOwnerQuery>,
    sink: Arc<dyn EventSink>,
}

impl WhitelistRegistry<MemoryStore> {
    /// Deploy a fresh in-memory registry.
    pub fn new(address: Address, owner: Address, config: RegistryConfig) -> Self {
        let state = RegistryState::new(owner, config);
        let mut store = MemoryStore::new();
        // MemoryStore::commit cannot fail.
        let _ = store.commit(&state);
        Self::from_parts(address, state, store)
    }
}

impl<S: RegistryStore> WhitelistRegistry<S> {
    /// Open a registry on top of `store`.
    ///
    /// A fresh store is initialized with `owner` and `config`. A store that
    /// already holds state keeps its persisted owner; its configuration must
    /// equal `config` or the call fails with `ConfigMismatch`.
    pub fn open(
        address: Address,
        owner: Address,
        config: RegistryConfig,
        mut store: S,
    ) -> Result<Self, RegistryError> {
        let state = match store.load()? {
            Some(state) => {
                if state.config != config {
                    return Err(RegistryError::ConfigMismatch);
                }
                info!(registry = %address, owner = %state.ownership.owner(), "registry restored");
                state
            }
            None => {
                let state = RegistryState::new(owner, config);
                store.commit(&state)?;
                info!(registry = %address, %owner, "registry initialized");
                state
            }
        };
        Ok(Self::from_parts(address, state, store))
    }

    fn from_parts(address: Address, state: RegistryState, store: S) -> Self {
        Self {
            address,
            state,
            store,
            clock: Arc::new(SystemClock),
            owners: Arc::new(UnavailableOwnerQuery),
            sink: Arc::new(NullSink),
        }
    }

    /// Use a different time source (builder pattern).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a wallet-owner query for the owner fallback of transfer checks.
    pub fn with_owner_query(mut self, owners: Arc<dyn WalletOwnerQuery>) -> Self {
        self.owners = owners;
        self
    }

    /// Send committed changes to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    // ── Immediate mode ──

    /// Whitelist every (target, selector) pair, all or nothing.
    pub fn add_entries(
        &mut self,
        caller: Address,
        targets: &[Address],
        selectors: &[Selector],
    ) -> Result<(), RegistryError> {
        self.transact("add_entries", |state, _now| {
            state.ensure_admin(caller)?;
            state.ensure_immediate()?;

            let mut events = Vec::new();
            for (target, selector) in validate_pairs(targets, selectors)? {
                state.allowlist.add(target, selector)?;
                events.push(GuardEvent::EntryAdded { target, selector });
            }
            Ok(((), events))
        })
    }

    /// Remove every (target, selector) pair, all or nothing.
    pub fn remove_entries(
        &mut self,
        caller: Address,
        targets: &[Address],
        selectors: &[Selector],
    ) -> Result<(), RegistryError> {
        self.transact("remove_entries", |state, _now| {
            state.ensure_admin(caller)?;
            state.ensure_immediate()?;

            let mut events = Vec::new();
            for (target, selector) in validate_pairs(targets, selectors)? {
                state.allowlist.remove(target, selector)?;
                events.push(GuardEvent::EntryRemoved { target, selector });
            }
            Ok(((), events))
        })
    }

    // ── Timelocked mode ──

    /// Schedule additions. Returns one operation id per pair.
    pub fn schedule_add(
        &mut self,
        caller: Address,
        targets: &[Address],
        selectors: &[Selector],
    ) -> Result<Vec<B256>, RegistryError> {
        self.schedule(caller, targets, selectors, OperationKind::Add)
    }

    /// Schedule removals. Returns one operation id per pair.
    pub fn schedule_remove(
        &mut self,
        caller: Address,
        targets: &[Address],
        selectors: &[Selector],
    ) -> Result<Vec<B256>, RegistryError> {
        self.schedule(caller, targets, selectors, OperationKind::Remove)
    }

    fn schedule(
        &mut self,
        caller: Address,
        targets: &[Address],
        selectors: &[Selector],
        kind: OperationKind,
    ) -> Result<Vec<B256>, RegistryError> {
        let action = match kind {
            OperationKind::Add => "schedule_add",
            OperationKind::Remove => "schedule_remove",
        };
        self.transact(action, |state, now| {
            state.ensure_admin(caller)?;
            let delay = state.timelock_delay()?;

            let mut ids = Vec::new();
            let mut events = Vec::new();
            for (target, selector) in validate_pairs(targets, selectors)? {
                ensure_applicable(state, kind, target, selector)?;
                let op = state
                    .governance
                    .schedule(target, selector, kind, now, delay)?;
                ids.push(op.id);
                events.push(GuardEvent::OperationScheduled {
                    operation_id: op.id,
                    target,
                    selector,
                    kind,
                    ready_after: op.ready_after,
                });
            }
            Ok((ids, events))
        })
    }

    /// Finalize the ready operation of every pair. Anyone may call this.
    ///
    /// Presence is re-checked against the allow-list as it stands now, not
    /// as it stood when the operation was scheduled.
    pub fn execute_operation(
        &mut self,
        caller: Address,
        targets: &[Address],
        selectors: &[Selector],
    ) -> Result<Vec<B256>, RegistryError> {
        self.transact("execute_operation", |state, now| {
            state.paused.ensure_not_paused()?;
            state.timelock_delay()?;

            let mut ids = Vec::new();
            let mut events = Vec::new();
            for (target, selector) in validate_pairs(targets, selectors)? {
                let (operation_id, kind) = {
                    let op = state.governance.ready_for(target, selector, now)?;
                    (op.id, op.kind)
                };

                match kind {
                    OperationKind::Add => state.allowlist.add(target, selector)?,
                    OperationKind::Remove => state.allowlist.remove(target, selector)?,
                }
                state
                    .governance
                    .mark_executed(target, selector, caller, now)?;

                ids.push(operation_id);
                events.push(GuardEvent::OperationExecuted {
                    operation_id,
                    target,
                    selector,
                    kind,
                    executed_by: caller,
                });
                events.push(match kind {
                    OperationKind::Add => GuardEvent::EntryAdded { target, selector },
                    OperationKind::Remove => GuardEvent::EntryRemoved { target, selector },
                });
            }
            Ok((ids, events))
        })
    }

    /// Abort the scheduled operation of every pair.
    pub fn cancel_operation(
        &mut self,
        caller: Address,
        targets: &[Address],
        selectors: &[Selector],
    ) -> Result<Vec<B256>, RegistryError> {
        self.transact("cancel_operation", |state, now| {
            state.ensure_admin(caller)?;
            state.timelock_delay()?;

            let mut ids = Vec::new();
            let mut events = Vec::new();
            for (target, selector) in validate_pairs(targets, selectors)? {
                let op = state.governance.cancel(target, selector, now)?;
                ids.push(op.id);
                events.push(GuardEvent::OperationCancelled {
                    operation_id: op.id,
                    target,
                    selector,
                    kind: op.kind,
                });
            }
            Ok((ids, events))
        })
    }

    // ── Recipients ──

    pub fn add_allowed_recipients(
        &mut self,
        caller: Address,
        token: Address,
        recipients: &[Address],
    ) -> Result<(), RegistryError> {
        self.transact("add_allowed_recipients", |state, _now| {
            state.ensure_admin(caller)?;
            validate_recipients(token, recipients)?;

            let mut events = Vec::new();
            for &recipient in recipients {
                state.recipients.add(token, recipient)?;
                events.push(GuardEvent::RecipientAdded { token, recipient });
            }
            Ok(((), events))
        })
    }

    pub fn remove_allowed_recipients(
        &mut self,
        caller: Address,
        token: Address,
        recipients: &[Address],
    ) -> Result<(), RegistryError> {
        self.transact("remove_allowed_recipients", |state, _now| {
            state.ensure_admin(caller)?;
            validate_recipients(token, recipients)?;

            let mut events = Vec::new();
            for &recipient in recipients {
                state.recipients.remove(token, recipient)?;
                events.push(GuardEvent::RecipientRemoved { token, recipient });
            }
            Ok(((), events))
        })
    }

    /// Mark a token as subject to recipient checks under the
    /// allowed-tokens-only scope. Setting the current value is a no-op.
    pub fn set_allowed_token(
        &mut self,
        caller: Address,
        token: Address,
        allowed: bool,
    ) -> Result<(), RegistryError> {
        self.transact("set_allowed_token", |state, _now| {
            state.ensure_admin(caller)?;
            if token.is_zero() {
                return Err(RegistryError::InvalidToken);
            }

            let mut events = Vec::new();
            if state.recipients.set_allowed_token(token, allowed) {
                events.push(GuardEvent::AllowedTokenSet { token, allowed });
            }
            Ok(((), events))
        })
    }

    // ── Pause and ownership ──

    pub fn pause(&mut self, caller: Address) -> Result<(), RegistryError> {
        self.transact("pause", |state, _now| {
            state.ownership.ensure_owner(caller)?;
            state.paused.pause()?;
            Ok(((), vec![GuardEvent::Paused { by: caller }]))
        })
    }

    pub fn unpause(&mut self, caller: Address) -> Result<(), RegistryError> {
        self.transact("unpause", |state, _now| {
            state.ownership.ensure_owner(caller)?;
            state.paused.unpause()?;
            Ok(((), vec![GuardEvent::Unpaused { by: caller }]))
        })
    }

    /// Offer ownership to `candidate`. Replaces any earlier offer.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        candidate: Address,
    ) -> Result<(), RegistryError> {
        self.transact("transfer_ownership", |state, _now| {
            state.ownership.begin_transfer(caller, candidate)?;
            Ok((
                (),
                vec![GuardEvent::OwnershipTransferStarted {
                    owner: caller,
                    candidate,
                }],
            ))
        })
    }

    /// Complete a pending transfer. Only the pending owner may call this.
    pub fn accept_ownership(&mut self, caller: Address) -> Result<(), RegistryError> {
        self.transact("accept_ownership", |state, _now| {
            let previous_owner = state.ownership.accept(caller)?;
            Ok((
                (),
                vec![GuardEvent::OwnershipTransferred {
                    previous_owner,
                    new_owner: caller,
                }],
            ))
        })
    }

    // ── Reads ──

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.state.ownership.owner()
    }

    pub fn pending_owner(&self) -> Option<Address> {
        self.state.ownership.pending_owner()
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused.is_paused()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.state.config
    }

    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Tear down the registry and hand back its store.
    pub fn into_store(self) -> S {
        self.store
    }

    pub fn is_whitelisted(&self, target: Address, selector: Selector) -> bool {
        self.state.allowlist.contains(target, selector)
    }

    pub fn is_active_target(&self, target: Address) -> bool {
        self.state.allowlist.is_active(target)
    }

    pub fn active_selector_count(&self, target: Address) -> usize {
        self.state.allowlist.selector_count(target)
    }

    pub fn active_target_count(&self) -> usize {
        self.state.allowlist.active_target_count()
    }

    pub fn whitelisted_selectors(&self, target: Address) -> Vec<Selector> {
        self.state.allowlist.selectors(target)
    }

    pub fn operation(&self, id: B256) -> Option<&PendingOperation> {
        self.state.governance.get(id)
    }

    pub fn pending_operation_for(
        &self,
        target: Address,
        selector: Selector,
    ) -> Option<&PendingOperation> {
        self.state.governance.pending_for(target, selector)
    }

    pub fn is_operation_pending(&self, id: B256) -> bool {
        self.state.governance.is_pending(id)
    }

    /// Whether `id` can be finalized right now.
    pub fn is_operation_ready(&self, id: B256) -> bool {
        self.state.governance.is_ready(id, self.clock.now())
    }

    pub fn is_allowed_recipient(&self, token: Address, recipient: Address) -> bool {
        self.state.recipients.is_allowed_recipient(token, recipient)
    }

    pub fn is_allowed_token(&self, token: Address) -> bool {
        self.state.recipients.is_allowed_token(token)
    }

    /// Decide whether `wallet` may send `token` to `recipient`, with the
    /// rule that decided it.
    pub fn transfer_authorization(
        &self,
        token: Address,
        recipient: Address,
        wallet: Address,
    ) -> TransferAuthorization {
        authorize_transfer(
            &self.state.recipients,
            self.state.config.recipient_scope,
            self.owners.as_ref(),
            token,
            recipient,
            wallet,
        )
    }

    pub fn is_transfer_authorized(&self, token: Address, recipient: Address, wallet: Address) -> bool {
        self.transfer_authorization(token, recipient, wallet)
            .is_authorized()
    }

    fn transact<T>(
        &mut self,
        action: &'static str,
        apply: impl FnOnce(&mut RegistryState, u64) -> Result<(T, Vec<GuardEvent>), RegistryError>,
    ) -> Result<T, RegistryError> {
        let now = self.clock.now();
        let mut next = self.state.clone();

        let (value, events) = apply(&mut next, now).inspect_err(|error| {
            debug!(registry = %self.address, action, %error, "registry call rejected");
        })?;
        self.store.commit(&next)?;
        self.state = next;

        info!(
            registry = %self.address,
            action,
            events = events.len(),
            "registry state committed"
        );
        for event in events {
            emit(self.sink.as_ref(), self.address, event);
        }
        Ok(value)
    }
}

/// Adds must target an absent pair and removes a present one.
fn ensure_applicable(
    state: &RegistryState,
    kind: OperationKind,
    target: Address,
    selector: Selector,
) -> Result<(), RegistryError> {
    let present = state.allowlist.contains(target, selector);
    match kind {
        OperationKind::Add if present => Err(RegistryError::AlreadyPresent { target, selector }),
        OperationKind::Remove if !present => Err(RegistryError::NotPresent { target, selector }),
        _ => Ok(()),
    }
}

fn validate_recipients(token: Address, recipients: &[Address]) -> Result<(), RegistryError> {
    if token.is_zero() {
        return Err(RegistryError::InvalidToken);
    }
    if recipients.is_empty() {
        return Err(RegistryError::EmptyBatch);
    }
    if let Some(index) = recipients.iter().position(|r| r.is_zero()) {
        return Err(RegistryError::InvalidRecipient { index });
    }
    Ok(())
}

impl<S: RegistryStore> WhitelistView for WhitelistRegistry<S> {
    fn is_whitelisted(&self, target: Address, selector: Selector) -> bool {
        WhitelistRegistry::is_whitelisted(self, target, selector)
    }

    fn is_active_target(&self, target: Address) -> bool {
        WhitelistRegistry::is_active_target(self, target)
    }

    fn is_transfer_authorized(&self, token: Address, recipient: Address, wallet: Address) -> bool {
        WhitelistRegistry::is_transfer_authorized(self, token, recipient, wallet)
    }
}

impl<S: RegistryStore> RegistryLookup for WhitelistRegistry<S> {
    fn registry_at(&self, address: Address) -> Option<&dyn WhitelistView> {
        (address == self.address).then_some(self as &dyn WhitelistView)
    }
}
