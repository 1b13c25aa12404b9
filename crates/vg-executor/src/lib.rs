//! # vg-executor
//!
//! The Guarded Batch Executor. A restricted credential submits a batch of
//! calls for a custodial account; every call must be whitelisted in the
//! registry, token transfers must go to authorized recipients, and token
//! approvals may only name active targets as spenders. Validated calls are
//! forwarded through the account's own runtime, and the first failure rolls
//! back the whole batch.
//!
//! ## Key components
//!
//! - [`GuardedExecutor`] — batch validation, pause, registry pointer, upgrades
//! - [`calldata`] — selector extraction and token payload decoding
//! - [`AccountRuntime`] — the account's forwarding and transaction capability
//! - [`ExecutorStorage`] / [`StorageMigration`] — versioned state for in-place upgrades

pub mod calldata;
pub mod config;
pub mod error;
pub mod executor;
pub mod runtime;
pub mod upgrade;

pub use calldata::{decode_token_call, selector_of, TokenCall, TokenFunction, TokenFunctionKind};
pub use config::ExecutorConfig;
pub use error::{CalldataError, ExecutorError, ForwardError, UpgradeError};
pub use executor::{BatchReceipt, GuardedExecutor};
pub use runtime::{AccountRuntime, ForwardedCall, SimulatedAccount};
pub use upgrade::{
    apply_migration, ExecutorStorage, StorageMigration, VersionBump, CURRENT_LAYOUT_VERSION,
};
