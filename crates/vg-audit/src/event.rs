// event.rs — Policy event model.
//
// Events are emitted only after a call has fully succeeded, so the audit
// trail never contains changes that were rolled back. Each event is wrapped
// in an AuditRecord that names the emitting component and, when written to
// the file log, links to the previous record's hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vg_core::{Address, OperationKind, Selector, B256};

/// Events emitted by the registry and the executor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GuardEvent {
    /// A (target, selector) pair became whitelisted.
    EntryAdded { target: Address, selector: Selector },

    /// A (target, selector) pair was removed from the allow-list.
    EntryRemoved { target: Address, selector: Selector },

    /// An allow-list change was queued behind the timelock.
    OperationScheduled {
        operation_id: B256,
        target: Address,
        selector: Selector,
        kind: OperationKind,
        ready_after: u64,
    },

    /// A queued change was finalized.
    OperationExecuted {
        operation_id: B256,
        target: Address,
        selector: Selector,
        kind: OperationKind,
        executed_by: Address,
    },

    /// A queued change was aborted by the owner.
    OperationCancelled {
        operation_id: B256,
        target: Address,
        selector: Selector,
        kind: OperationKind,
    },

    RecipientAdded { token: Address, recipient: Address },

    RecipientRemoved { token: Address, recipient: Address },

    /// A token was moved into or out of the recipient-restricted set.
    AllowedTokenSet { token: Address, allowed: bool },

    Paused { by: Address },

    Unpaused { by: Address },

    /// The owner offered ownership; nothing changes until accepted.
    OwnershipTransferStarted { owner: Address, candidate: Address },

    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },

    /// The executor now checks batches against a different registry.
    RegistryUpdated { previous: Address, new: Address },

    /// A guarded batch completed.
    BatchExecuted {
        executor: Address,
        targets: Vec<Address>,
        selectors: Vec<Selector>,
        timestamp: u64,
    },

    /// The executor's logic moved to a new storage layout version.
    ExecutorUpgraded { from_version: u32, to_version: u32 },
}

impl GuardEvent {
    /// Get the event type name as a string.
    pub fn event_type(&self) -> &'static str {
        match self {
            GuardEvent::EntryAdded { .. } => "entry_added",
            GuardEvent::EntryRemoved { .. } => "entry_removed",
            GuardEvent::OperationScheduled { .. } => "operation_scheduled",
            GuardEvent::OperationExecuted { .. } => "operation_executed",
            GuardEvent::OperationCancelled { .. } => "operation_cancelled",
            GuardEvent::RecipientAdded { .. } => "recipient_added",
            GuardEvent::RecipientRemoved { .. } => "recipient_removed",
            GuardEvent::AllowedTokenSet { .. } => "allowed_token_set",
            GuardEvent::Paused { .. } => "paused",
            GuardEvent::Unpaused { .. } => "unpaused",
            GuardEvent::OwnershipTransferStarted { .. } => "ownership_transfer_started",
            GuardEvent::OwnershipTransferred { .. } => "ownership_transferred",
            GuardEvent::RegistryUpdated { .. } => "registry_updated",
            GuardEvent::BatchExecuted { .. } => "batch_executed",
            GuardEvent::ExecutorUpgraded { .. } => "executor_upgraded",
        }
    }
}

/// One line of the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub record_id: Uuid,

    /// Wall-clock time the record was written (UTC).
    pub recorded_at: DateTime<Utc>,

    /// Address of the component that emitted the event.
    pub source: Address,

    pub event: GuardEvent,

    /// Hash of the previous record in the log. `None` for the first record
    /// and for sinks that do not chain.
    pub previous_hash: Option<String>,
}

impl AuditRecord {
    pub fn new(source: Address, event: GuardEvent) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            source,
            event,
            previous_hash: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_matches_serde_tag() {
        let event = GuardEvent::OwnershipTransferStarted {
            owner: Address::with_last_byte(1),
            candidate: Address::with_last_byte(2),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], event.event_type());
    }

    #[test]
    fn batch_event_serializes_hex_selectors() {
        let event = GuardEvent::BatchExecuted {
            executor: Address::with_last_byte(9),
            targets: vec![Address::with_last_byte(1)],
            selectors: vec![Selector::new([0xa9, 0x05, 0x9c, 0xbb])],
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"batch_executed\""));
        assert!(json.contains("0xa9059cbb"));

        let restored: GuardEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, event);
    }

    #[test]
    fn record_ids_are_unique() {
        let e1 = AuditRecord::new(Address::ZERO, GuardEvent::Paused { by: Address::ZERO });
        let e2 = AuditRecord::new(Address::ZERO, GuardEvent::Paused { by: Address::ZERO });
        assert_ne!(e1.record_id, e2.record_id);
        assert!(e1.previous_hash.is_none());
    }
}
