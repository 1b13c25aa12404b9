// ownership.rs — Two-step ownership handshake.
//
// The active owner offers ownership to a candidate; nothing changes until the
// candidate accepts. A new offer replaces the previous candidate, which then
// loses the ability to accept.
//
//   owner ──transfer(X)──▶ pending = X ──accept() by X──▶ owner = X, pending = None

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::AccessError;

/// Current owner plus an optional pending owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ownership {
    owner: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pending_owner: Option<Address>,
}

impl Ownership {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            pending_owner: None,
        }
    }

    /// Rebuild an ownership record from persisted fields.
    pub fn from_parts(owner: Address, pending_owner: Option<Address>) -> Self {
        Self {
            owner,
            pending_owner,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn pending_owner(&self) -> Option<Address> {
        self.pending_owner
    }

    /// Fail with `NotOwner` unless `caller` is the active owner.
    pub fn ensure_owner(&self, caller: Address) -> Result<(), AccessError> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(AccessError::NotOwner { caller })
        }
    }

    /// Record `candidate` as the pending owner. The active owner is unchanged.
    pub fn begin_transfer(&mut self, caller: Address, candidate: Address) -> Result<(), AccessError> {
        self.ensure_owner(caller)?;
        if candidate.is_zero() {
            return Err(AccessError::InvalidCandidate);
        }
        self.pending_owner = Some(candidate);
        Ok(())
    }

    /// Complete the handshake. Returns the previous owner.
    pub fn accept(&mut self, caller: Address) -> Result<Address, AccessError> {
        match self.pending_owner {
            Some(pending) if pending == caller => {
                let previous = self.owner;
                self.owner = caller;
                self.pending_owner = None;
                Ok(previous)
            }
            _ => Err(AccessError::NotPendingOwner { caller }),
        }
    }
}
