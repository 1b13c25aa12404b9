// executor.rs — GuardedExecutor: validates and forwards batches.
//
// A batch is handled one execution at a time, in order:
//
//   1. read the selector (payload must have at least four bytes)
//   2. require (target, selector) to be whitelisted in the registry
//   3. token transfers: exact length, recipient must be authorized
//   4. token approvals: exact length, spender must be an active target
//   5. forward through the account runtime as the custodial account
//
// The whole loop runs inside `AccountRuntime::atomically`, so the first
// failure rolls back every call already forwarded in the batch.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, Selector};
use tracing::{debug, info, warn};
use vg_audit::{emit, EventSink, GuardEvent, NullSink};
use vg_core::{Clock, Execution, SystemClock};
use vg_registry::{RegistryLookup, WhitelistView};

use crate::calldata::{self, TokenCall};
use crate::config::ExecutorConfig;
use crate::error::ExecutorError;
use crate::runtime::AccountRuntime;
use crate::upgrade::{apply_migration, ExecutorStorage, StorageMigration};

/// Summary of a completed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReceipt {
    /// The custodial account the batch ran as.
    pub executor: Address,
    pub targets: Vec<Address>,
    pub selectors: Vec<Selector>,
    /// Return data of each call, in batch order.
    pub outputs: Vec<Bytes>,
    pub timestamp: u64,
}

/// Gatekeeper between a restricted credential and a custodial account.
pub struct GuardedExecutor {
    address: Address,
    storage: ExecutorStorage,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

impl GuardedExecutor {
    /// Deploy an executor at `address` pointing at `registry`.
    pub fn new(address: Address, owner: Address, registry: Address) -> Result<Self, ExecutorError> {
        Self::from_storage(address, ExecutorStorage::new(owner, registry))
    }

    pub fn from_config(address: Address, config: &ExecutorConfig) -> Result<Self, ExecutorError> {
        Self::new(address, config.owner, config.registry)
    }

    /// Restore an executor from a persisted storage record.
    pub fn from_storage(address: Address, storage: ExecutorStorage) -> Result<Self, ExecutorError> {
        if storage.registry.is_zero() {
            return Err(ExecutorError::InvalidRegistry);
        }
        Ok(Self {
            address,
            storage,
            clock: Arc::new(SystemClock),
            sink: Arc::new(NullSink),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.storage.ownership.owner()
    }

    pub fn pending_owner(&self) -> Option<Address> {
        self.storage.ownership.pending_owner()
    }

    pub fn registry(&self) -> Address {
        self.storage.registry
    }

    pub fn is_paused(&self) -> bool {
        self.storage.paused.is_paused()
    }

    /// Storage layout version of the running logic.
    pub fn layout_version(&self) -> u32 {
        self.storage.layout_version
    }

    /// Snapshot of the persisted state.
    pub fn storage(&self) -> &ExecutorStorage {
        &self.storage
    }

    /// Validate and forward `executions` on behalf of `caller`.
    ///
    /// `caller` is the custodial account: transfers are authorized against
    /// it and calls are forwarded as it. Authenticating the credential that
    /// triggered the batch happens before this call.
    pub fn execute_guarded_batch<L, R>(
        &self,
        caller: Address,
        executions: &[Execution],
        registries: &L,
        runtime: &mut R,
    ) -> Result<BatchReceipt, ExecutorError>
    where
        L: RegistryLookup + ?Sized,
        R: AccountRuntime,
    {
        self.storage.paused.ensure_not_paused()?;
        if executions.is_empty() {
            return Err(ExecutorError::EmptyBatch);
        }

        let registry_address = self.storage.registry;
        let registry = registries
            .registry_at(registry_address)
            .ok_or(ExecutorError::RegistryUnavailable {
                registry: registry_address,
            })?;

        let (selectors, outputs) = runtime
            .atomically(|rt| {
                let mut selectors = Vec::with_capacity(executions.len());
                let mut outputs = Vec::with_capacity(executions.len());
                for (index, execution) in executions.iter().enumerate() {
                    let selector = check_execution(index, execution, registry, caller)?;
                    debug!(index, target = %execution.target, %selector, "execution validated");

                    let output = rt
                        .forward(caller, execution)
                        .map_err(|source| ExecutorError::CallFailed { index, source })?;
                    selectors.push(selector);
                    outputs.push(output);
                }
                Ok::<_, ExecutorError>((selectors, outputs))
            })
            .inspect_err(|error| {
                warn!(executor = %self.address, %caller, %error, "guarded batch rejected");
            })?;

        let receipt = BatchReceipt {
            executor: caller,
            targets: executions.iter().map(|e| e.target).collect(),
            selectors,
            outputs,
            timestamp: self.clock.now(),
        };

        info!(
            executor = %self.address,
            %caller,
            calls = executions.len(),
            "guarded batch executed"
        );
        emit(
            self.sink.as_ref(),
            self.address,
            GuardEvent::BatchExecuted {
                executor: receipt.executor,
                targets: receipt.targets.clone(),
                selectors: receipt.selectors.clone(),
                timestamp: receipt.timestamp,
            },
        );
        Ok(receipt)
    }

    pub fn pause(&mut self, caller: Address) -> Result<(), ExecutorError> {
        let mut next = self.storage.clone();
        next.ownership.ensure_owner(caller)?;
        next.paused.pause()?;
        self.commit(next, "pause", GuardEvent::Paused { by: caller });
        Ok(())
    }

    pub fn unpause(&mut self, caller: Address) -> Result<(), ExecutorError> {
        let mut next = self.storage.clone();
        next.ownership.ensure_owner(caller)?;
        next.paused.unpause()?;
        self.commit(next, "unpause", GuardEvent::Unpaused { by: caller });
        Ok(())
    }

    /// Point subsequent batches at a different registry.
    pub fn update_registry(&mut self, caller: Address, registry: Address) -> Result<(), ExecutorError> {
        let mut next = self.storage.clone();
        next.ownership.ensure_owner(caller)?;
        if registry.is_zero() {
            return Err(ExecutorError::InvalidRegistry);
        }
        let previous = std::mem::replace(&mut next.registry, registry);
        self.commit(
            next,
            "update_registry",
            GuardEvent::RegistryUpdated {
                previous,
                new: registry,
            },
        );
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: Address, candidate: Address) -> Result<(), ExecutorError> {
        let mut next = self.storage.clone();
        next.ownership.begin_transfer(caller, candidate)?;
        self.commit(
            next,
            "transfer_ownership",
            GuardEvent::OwnershipTransferStarted {
                owner: caller,
                candidate,
            },
        );
        Ok(())
    }

    pub fn accept_ownership(&mut self, caller: Address) -> Result<(), ExecutorError> {
        let mut next = self.storage.clone();
        let previous_owner = next.ownership.accept(caller)?;
        self.commit(
            next,
            "accept_ownership",
            GuardEvent::OwnershipTransferred {
                previous_owner,
                new_owner: caller,
            },
        );
        Ok(())
    }

    /// Replace the logic in place by migrating storage to a new layout.
    pub fn upgrade(&mut self, caller: Address, migration: &dyn StorageMigration) -> Result<(), ExecutorError> {
        self.storage.ownership.ensure_owner(caller)?;
        let next = apply_migration(&self.storage, migration)?;
        let event = GuardEvent::ExecutorUpgraded {
            from_version: self.storage.layout_version,
            to_version: next.layout_version,
        };
        self.commit(next, "upgrade", event);
        Ok(())
    }

    fn commit(&mut self, next: ExecutorStorage, action: &'static str, event: GuardEvent) {
        self.storage = next;
        info!(executor = %self.address, action, "executor state committed");
        emit(self.sink.as_ref(), self.address, event);
    }
}

/// Steps 1-4 for one execution. Returns its selector.
fn check_execution(
    index: usize,
    execution: &Execution,
    registry: &dyn WhitelistView,
    wallet: Address,
) -> Result<Selector, ExecutorError> {
    let target = execution.target;
    let invalid = |source| ExecutorError::InvalidCalldata { index, source };

    let selector = calldata::selector_of(&execution.payload).map_err(invalid)?;
    if !registry.is_whitelisted(target, selector) {
        return Err(ExecutorError::NotWhitelisted {
            index,
            target,
            selector,
        });
    }

    match calldata::decode_token_call(&execution.payload).map_err(invalid)? {
        Some(TokenCall::Transfer { recipient, .. }) => {
            if !registry.is_transfer_authorized(target, recipient, wallet) {
                return Err(ExecutorError::UnauthorizedTransfer {
                    index,
                    token: target,
                    recipient,
                });
            }
        }
        Some(TokenCall::Approval { spender, .. }) => {
            if !registry.is_active_target(spender) {
                return Err(ExecutorError::UnauthorizedApprove {
                    index,
                    token: target,
                    spender,
                });
            }
        }
        None => {}
    }
    Ok(selector)
}
