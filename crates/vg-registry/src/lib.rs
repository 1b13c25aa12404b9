//! # vg-registry
//!
//! The Whitelist Registry: an owner-managed allow-list of (target contract,
//! function selector) pairs, per-token allowed recipients, and the transfer
//! authorization rule the executor relies on.
//!
//! Allow-list changes are governed in one of two modes fixed at deployment
//! (see [`GovernanceMode`]): applied immediately by the owner, or scheduled
//! and finalized by anyone after a timelock delay.
//!
//! ## Quick Example
//!
//! ```rust
//! use vg_core::{Address, Selector};
//! use vg_registry::{RegistryConfig, WhitelistRegistry};
//!
//! let owner = Address::with_last_byte(1);
//! let token = Address::with_last_byte(2);
//! let transfer = Selector::new([0xa9, 0x05, 0x9c, 0xbb]);
//!
//! let mut registry =
//!     WhitelistRegistry::new(Address::with_last_byte(0xEE), owner, RegistryConfig::immediate());
//! registry.add_entries(owner, &[token], &[transfer]).unwrap();
//!
//! assert!(registry.is_whitelisted(token, transfer));
//! assert_eq!(registry.active_selector_count(token), 1);
//! ```

pub mod allowlist;
pub mod config;
pub mod error;
pub mod governance;
pub mod recipients;
pub mod registry;
pub mod state;
pub mod store;
pub mod view;

pub use allowlist::AllowList;
pub use config::{GovernanceMode, RecipientScope, RegistryConfig, DEFAULT_TIMELOCK_DELAY_SECS};
pub use error::RegistryError;
pub use governance::{operation_id, GovernanceQueue, OperationState, PendingOperation};
pub use recipients::{AuthorizationBasis, RecipientBook, TransferAuthorization};
pub use registry::WhitelistRegistry;
pub use state::RegistryState;
pub use store::{JsonFileStore, MemoryStore, RegistryStore};
pub use view::{RegistryLookup, WhitelistView};
