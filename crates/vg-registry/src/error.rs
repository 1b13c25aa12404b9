// error.rs — Error types for the whitelist registry.
//
// Every error aborts the whole call: the registry works on a copy of its
// state and only commits when the call succeeds.

use alloy_primitives::{Address, Selector, B256};
use thiserror::Error;
use vg_core::{AccessError, PauseError};

/// Errors returned by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    // ── Malformed input ──
    /// A batched call was given no items.
    #[error("empty batch")]
    EmptyBatch,

    #[error("length mismatch: {targets} targets, {selectors} selectors")]
    LengthMismatch { targets: usize, selectors: usize },

    #[error("invalid target at index {index}: zero address")]
    InvalidTarget { index: usize },

    #[error("invalid selector at index {index}: zero selector")]
    InvalidSelector { index: usize },

    #[error("invalid token: zero address")]
    InvalidToken,

    #[error("invalid recipient at index {index}: zero address")]
    InvalidRecipient { index: usize },

    // ── Authorization / idempotency guards ──
    #[error("{target}:{selector} is already whitelisted")]
    AlreadyPresent { target: Address, selector: Selector },

    #[error("{target}:{selector} is not whitelisted")]
    NotPresent { target: Address, selector: Selector },

    #[error("recipient {recipient} is already allowed for token {token}")]
    RecipientAlreadyAllowed { token: Address, recipient: Address },

    #[error("recipient {recipient} is not allowed for token {token}")]
    RecipientNotAllowed { token: Address, recipient: Address },

    // ── Governance state machine ──
    #[error("{target}:{selector} already has scheduled operation {operation_id}")]
    OperationAlreadyPending {
        target: Address,
        selector: Selector,
        operation_id: B256,
    },

    #[error("no scheduled operation for {target}:{selector}")]
    OperationNotPending { target: Address, selector: Selector },

    #[error("operation {operation_id} is not ready: ready after {ready_after}, now {now}")]
    OperationNotReady {
        operation_id: B256,
        ready_after: u64,
        now: u64,
    },

    /// Direct allow-list edits are disabled in timelocked mode.
    #[error("allow-list changes must be scheduled through the timelock")]
    DirectChangesDisabled,

    /// Scheduling is only available in timelocked mode.
    #[error("registry is not in timelocked mode")]
    TimelockDisabled,

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Pause(#[from] PauseError),

    // ── Configuration and persistence ──
    #[error("stored registry configuration differs from the requested configuration")]
    ConfigMismatch,

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
