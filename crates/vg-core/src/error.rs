// error.rs — Error types shared by every owned, pausable component.

use alloy_primitives::Address;
use thiserror::Error;

/// Access-control failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    /// The caller is not the current owner.
    #[error("caller {caller} is not the owner")]
    NotOwner { caller: Address },

    /// The caller tried to accept ownership without being the pending owner.
    #[error("caller {caller} is not the pending owner")]
    NotPendingOwner { caller: Address },

    /// Ownership cannot be offered to the zero address.
    #[error("ownership candidate cannot be the zero address")]
    InvalidCandidate,
}

/// Pause state-machine failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PauseError {
    /// The operation requires the component to be running, but it is paused.
    #[error("component is paused")]
    EnforcedPause,

    /// `unpause` was called on a component that is not paused.
    #[error("component is not paused")]
    ExpectedPause,
}

/// Failures of the external wallet-owner query.
///
/// These never abort an authorization decision; callers downgrade them to
/// "not an owner".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OwnerQueryError {
    /// The wallet does not expose an owner query at all.
    #[error("owner query unavailable for wallet {wallet}")]
    Unavailable { wallet: Address },

    /// The wallet's owner query failed while executing.
    #[error("owner query for wallet {wallet} reverted: {reason}")]
    Reverted { wallet: Address, reason: String },
}
