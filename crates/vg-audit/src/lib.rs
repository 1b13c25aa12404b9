//! # vg-audit
//!
//! Policy events and the tamper-evident audit trail for VaultGate.
//!
//! Every committed state change in the registry and executor (allow-list
//! edits, governance transitions, recipient changes, pause toggles, ownership
//! moves, executed batches) is emitted as a [`GuardEvent`] to an
//! [`EventSink`]. The [`AuditLog`] sink writes JSONL records linked by a
//! SHA-256 hash chain so insertions, deletions and edits are detectable.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use vg_audit::{AuditLog, EventSink, GuardEvent};
//! use vg_core::Address;
//!
//! let log = AuditLog::open("/tmp/vaultgate-audit.jsonl").unwrap();
//! log.record(
//!     Address::with_last_byte(1),
//!     GuardEvent::Paused { by: Address::with_last_byte(2) },
//! )
//! .unwrap();
//! ```

pub mod error;
pub mod event;
pub mod hasher;
pub mod log;
pub mod sink;

pub use error::AuditError;
pub use event::{AuditRecord, GuardEvent};
pub use log::AuditLog;
pub use sink::{emit, EventSink, MemorySink, NullSink};
