//! # vg-core
//!
//! Shared building blocks for the VaultGate policy engine.
//!
//! Both the Whitelist Registry and the Guarded Batch Executor are owned,
//! pausable components that read a clock and (indirectly) ask a wallet who
//! its owners are. Those shared pieces live here so the two components
//! enforce them identically.
//!
//! ## Key components
//!
//! - [`Ownership`] — two-step ownership handshake (transfer, then accept)
//! - [`PauseFlag`] — emergency stop with strict pause/unpause transitions
//! - [`Clock`] — injectable time source ([`SystemClock`], [`ManualClock`])
//! - [`WalletOwnerQuery`] — the external "is X an owner of wallet W?" capability
//! - [`Execution`] — one (target, value, payload) unit of a guarded batch

pub mod clock;
pub mod error;
pub mod execution;
pub mod operation;
pub mod ownership;
pub mod owners;
pub mod pause;

pub use alloy_primitives::{Address, Bytes, Selector, B256, U256};

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AccessError, OwnerQueryError, PauseError};
pub use execution::Execution;
pub use operation::OperationKind;
pub use ownership::Ownership;
pub use owners::{EnumeratedOwners, OwnerEnumeration, StaticOwners, UnavailableOwnerQuery, WalletOwnerQuery};
pub use pause::PauseFlag;
