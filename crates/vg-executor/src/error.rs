// error.rs — Error types for the guarded batch executor.

use alloy_primitives::{Address, Selector};
use thiserror::Error;
use vg_core::{AccessError, PauseError};

/// A token payload that does not match its function's argument layout.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalldataError {
    #[error("payload of {len} bytes has no function selector")]
    TooShort { len: usize },

    #[error("{signature} payload must be {expected} bytes, got {actual}")]
    LengthMismatch {
        signature: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The high 12 bytes of an address word must be zero.
    #[error("address argument in word {word} has non-zero padding")]
    DirtyAddressPadding { word: usize },
}

/// A forwarded call that the account runtime could not complete.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForwardError {
    #[error("call to {target} reverted: {reason}")]
    Reverted { target: Address, reason: String },
}

/// A rejected logic upgrade.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpgradeError {
    #[error("storage is at layout version {current}, migration starts at {migration_from}")]
    VersionMismatch { current: u32, migration_from: u32 },

    #[error("migration from {from} to {to} does not move forward")]
    NotForward { from: u32, to: u32 },

    /// The migration changed a field whose meaning must be preserved.
    #[error("migration altered persisted field '{field}'")]
    StorageLayoutViolation { field: &'static str },

    #[error("migration failed: {0}")]
    MigrationFailed(String),
}

/// Errors returned by executor operations.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("empty batch")]
    EmptyBatch,

    #[error("invalid calldata in execution {index}: {source}")]
    InvalidCalldata { index: usize, source: CalldataError },

    #[error("execution {index}: {target}:{selector} is not whitelisted")]
    NotWhitelisted {
        index: usize,
        target: Address,
        selector: Selector,
    },

    #[error("execution {index}: transfer of {token} to {recipient} is not authorized")]
    UnauthorizedTransfer {
        index: usize,
        token: Address,
        recipient: Address,
    },

    #[error("execution {index}: approval of {token} for {spender} is not authorized")]
    UnauthorizedApprove {
        index: usize,
        token: Address,
        spender: Address,
    },

    #[error("no registry deployed at {registry}")]
    RegistryUnavailable { registry: Address },

    #[error("invalid registry: zero address")]
    InvalidRegistry,

    #[error("execution {index} failed: {source}")]
    CallFailed { index: usize, source: ForwardError },

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Pause(#[from] PauseError),

    #[error("upgrade rejected: {0}")]
    Upgrade(#[from] UpgradeError),

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },
}
