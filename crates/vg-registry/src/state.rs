// state.rs — The complete persisted state of one registry.

use serde::{Deserialize, Serialize};
use vg_core::{Address, Ownership, PauseFlag};

use crate::allowlist::AllowList;
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::governance::GovernanceQueue;
use crate::recipients::RecipientBook;

/// Everything a registry persists between calls.
///
/// The registry mutates a clone of this and swaps it in only after the
/// store accepted it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryState {
    pub config: RegistryConfig,
    pub ownership: Ownership,

    #[serde(default)]
    pub paused: PauseFlag,

    #[serde(default)]
    pub allowlist: AllowList,

    #[serde(default)]
    pub governance: GovernanceQueue,

    #[serde(default)]
    pub recipients: RecipientBook,
}

impl RegistryState {
    pub fn new(owner: Address, config: RegistryConfig) -> Self {
        Self {
            config,
            ownership: Ownership::new(owner),
            paused: PauseFlag::default(),
            allowlist: AllowList::default(),
            governance: GovernanceQueue::default(),
            recipients: RecipientBook::default(),
        }
    }

    /// Owner-only, not-paused guard shared by every administrative mutation.
    pub(crate) fn ensure_admin(&self, caller: Address) -> Result<(), RegistryError> {
        self.ownership.ensure_owner(caller)?;
        self.paused.ensure_not_paused()?;
        Ok(())
    }

    pub(crate) fn ensure_immediate(&self) -> Result<(), RegistryError> {
        match self.config.timelock_delay() {
            None => Ok(()),
            Some(_) => Err(RegistryError::DirectChangesDisabled),
        }
    }

    pub(crate) fn timelock_delay(&self) -> Result<u64, RegistryError> {
        self.config
            .timelock_delay()
            .ok_or(RegistryError::TimelockDisabled)
    }
}
