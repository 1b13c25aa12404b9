// governance.rs — Timelocked allow-list changes.
//
// The owner schedules an add or remove for a (target, selector) pair. After
// the delay has fully elapsed anyone may finalize it; until then the owner
// may cancel it. Each pair has at most one scheduled operation at a time.
//
// State machine:
//
//   Scheduled ──→ Executed
//       │
//       └──────→ Cancelled
//
// Terminal operations are kept as immutable records. A per-pair generation
// counter goes into the operation id, so scheduling the same change again
// after it finished yields a fresh id instead of colliding with the old
// record.

use std::collections::BTreeMap;
use std::fmt;

use alloy_primitives::{keccak256, Address, Selector, B256};
use serde::{Deserialize, Serialize};
use vg_core::OperationKind;

use crate::error::RegistryError;

/// Lifecycle of a scheduled allow-list change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    Scheduled,
    Executed,
    Cancelled,
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Executed | OperationState::Cancelled)
    }

    pub fn can_transition_to(&self, next: &OperationState) -> bool {
        matches!(
            (self, next),
            (OperationState::Scheduled, OperationState::Executed)
                | (OperationState::Scheduled, OperationState::Cancelled)
        )
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationState::Scheduled => write!(f, "scheduled"),
            OperationState::Executed => write!(f, "executed"),
            OperationState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Derive the id of an operation.
///
/// `keccak256(target ‖ selector ‖ kind tag ‖ generation as big-endian u64)`
pub fn operation_id(
    target: Address,
    selector: Selector,
    kind: OperationKind,
    generation: u64,
) -> B256 {
    let mut preimage = Vec::with_capacity(20 + 4 + 1 + 8);
    preimage.extend_from_slice(target.as_slice());
    preimage.extend_from_slice(selector.as_slice());
    preimage.push(kind.tag());
    preimage.extend_from_slice(&generation.to_be_bytes());
    keccak256(preimage)
}

/// A scheduled (or finished) allow-list change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingOperation {
    pub id: B256,
    pub target: Address,
    pub selector: Selector,
    pub kind: OperationKind,
    pub generation: u64,
    pub scheduled_at: u64,
    /// `scheduled_at + delay`; the operation is ready strictly after this.
    pub ready_after: u64,
    pub state: OperationState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_by: Option<Address>,
}

impl PendingOperation {
    pub fn is_pending(&self) -> bool {
        self.state == OperationState::Scheduled
    }

    pub fn is_ready(&self, now: u64) -> bool {
        self.is_pending() && now > self.ready_after
    }

    fn transition(&mut self, next: OperationState, now: u64) -> Result<(), RegistryError> {
        if !self.state.can_transition_to(&next) {
            return Err(RegistryError::OperationNotPending {
                target: self.target,
                selector: self.selector,
            });
        }
        tracing::debug!(
            operation_id = %self.id,
            from = %self.state,
            to = %next,
            "operation state transition"
        );
        self.state = next;
        self.finalized_at = Some(now);
        Ok(())
    }
}

/// Per-pair bookkeeping: the next generation and the latest operation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
struct PairCursor {
    next_generation: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latest: Option<B256>,
}

/// All operations ever scheduled on a registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GovernanceQueue {
    operations: BTreeMap<B256, PendingOperation>,
    cursors: BTreeMap<Address, BTreeMap<Selector, PairCursor>>,
}

impl GovernanceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: B256) -> Option<&PendingOperation> {
        self.operations.get(&id)
    }

    /// The scheduled (non-terminal) operation for a pair, if any.
    pub fn pending_for(&self, target: Address, selector: Selector) -> Option<&PendingOperation> {
        let latest = self.cursors.get(&target)?.get(&selector)?.latest?;
        self.operations.get(&latest).filter(|op| op.is_pending())
    }

    pub fn is_pending(&self, id: B256) -> bool {
        self.get(id).is_some_and(PendingOperation::is_pending)
    }

    pub fn is_ready(&self, id: B256, now: u64) -> bool {
        self.get(id).is_some_and(|op| op.is_ready(now))
    }

    /// Number of operations still waiting to be finalized or cancelled.
    pub fn pending_count(&self) -> usize {
        self.operations.values().filter(|op| op.is_pending()).count()
    }

    /// Queue a new operation for a pair.
    ///
    /// Fails with `OperationAlreadyPending` while the pair has a scheduled
    /// operation of either kind.
    pub fn schedule(
        &mut self,
        target: Address,
        selector: Selector,
        kind: OperationKind,
        now: u64,
        delay: u64,
    ) -> Result<&PendingOperation, RegistryError> {
        if let Some(existing) = self.pending_for(target, selector) {
            return Err(RegistryError::OperationAlreadyPending {
                target,
                selector,
                operation_id: existing.id,
            });
        }

        let cursor = self
            .cursors
            .entry(target)
            .or_default()
            .entry(selector)
            .or_default();
        let generation = cursor.next_generation;
        let id = operation_id(target, selector, kind, generation);
        cursor.next_generation += 1;
        cursor.latest = Some(id);

        let op = PendingOperation {
            id,
            target,
            selector,
            kind,
            generation,
            scheduled_at: now,
            ready_after: now.saturating_add(delay),
            state: OperationState::Scheduled,
            finalized_at: None,
            executed_by: None,
        };
        Ok(&*self.operations.entry(id).or_insert(op))
    }

    /// The scheduled operation for a pair, provided it is ready at `now`.
    pub fn ready_for(
        &self,
        target: Address,
        selector: Selector,
        now: u64,
    ) -> Result<&PendingOperation, RegistryError> {
        let op = self
            .pending_for(target, selector)
            .ok_or(RegistryError::OperationNotPending { target, selector })?;
        if !op.is_ready(now) {
            return Err(RegistryError::OperationNotReady {
                operation_id: op.id,
                ready_after: op.ready_after,
                now,
            });
        }
        Ok(op)
    }

    /// Move the scheduled operation of a pair to `Executed`.
    ///
    /// Readiness is the caller's concern; see [`GovernanceQueue::ready_for`].
    pub fn mark_executed(
        &mut self,
        target: Address,
        selector: Selector,
        executed_by: Address,
        now: u64,
    ) -> Result<&PendingOperation, RegistryError> {
        let op = self.pending_mut(target, selector)?;
        op.transition(OperationState::Executed, now)?;
        op.executed_by = Some(executed_by);
        Ok(&*op)
    }

    /// Move the scheduled operation of a pair to `Cancelled`.
    pub fn cancel(
        &mut self,
        target: Address,
        selector: Selector,
        now: u64,
    ) -> Result<&PendingOperation, RegistryError> {
        let op = self.pending_mut(target, selector)?;
        op.transition(OperationState::Cancelled, now)?;
        Ok(&*op)
    }

    fn pending_mut(
        &mut self,
        target: Address,
        selector: Selector,
    ) -> Result<&mut PendingOperation, RegistryError> {
        let not_pending = RegistryError::OperationNotPending { target, selector };
        let Some(id) = self.pending_for(target, selector).map(|op| op.id) else {
            return Err(not_pending);
        };
        self.operations.get_mut(&id).ok_or(not_pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: u64 = 100;
    const SEL: Selector = Selector::new([0xa9, 0x05, 0x9c, 0xbb]);

    fn addr(byte: u8) -> Address {
        Address::with_last_byte(byte)
    }

    #[test]
    fn valid_transitions() {
        assert!(OperationState::Scheduled.can_transition_to(&OperationState::Executed));
        assert!(OperationState::Scheduled.can_transition_to(&OperationState::Cancelled));
    }

    #[test]
    fn terminal_states_are_final() {
        for terminal in [OperationState::Executed, OperationState::Cancelled] {
            assert!(terminal.is_terminal());
            for next in [
                OperationState::Scheduled,
                OperationState::Executed,
                OperationState::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(&next));
            }
        }
    }

    #[test]
    fn ids_are_deterministic_and_distinct() {
        let a = operation_id(addr(1), SEL, OperationKind::Add, 0);
        assert_eq!(a, operation_id(addr(1), SEL, OperationKind::Add, 0));
        assert_ne!(a, operation_id(addr(1), SEL, OperationKind::Remove, 0));
        assert_ne!(a, operation_id(addr(1), SEL, OperationKind::Add, 1));
        assert_ne!(a, operation_id(addr(2), SEL, OperationKind::Add, 0));
    }

    #[test]
    fn ready_strictly_after_delay() {
        let mut queue = GovernanceQueue::new();
        let id = queue.schedule(addr(1), SEL, OperationKind::Add, 1_000, DELAY).unwrap().id;

        assert!(queue.is_pending(id));
        assert!(!queue.is_ready(id, 1_000));
        assert!(!queue.is_ready(id, 1_000 + DELAY));
        assert!(queue.is_ready(id, 1_000 + DELAY + 1));

        assert!(matches!(
            queue.ready_for(addr(1), SEL, 1_000 + DELAY),
            Err(RegistryError::OperationNotReady { ready_after: 1_100, now: 1_100, .. })
        ));
        assert_eq!(queue.ready_for(addr(1), SEL, 1_000 + DELAY + 1).unwrap().id, id);
    }

    #[test]
    fn second_schedule_for_same_pair_rejected() {
        let mut queue = GovernanceQueue::new();
        let id = queue.schedule(addr(1), SEL, OperationKind::Add, 0, DELAY).unwrap().id;

        match queue.schedule(addr(1), SEL, OperationKind::Remove, 0, DELAY) {
            Err(RegistryError::OperationAlreadyPending { operation_id, .. }) => {
                assert_eq!(operation_id, id)
            }
            other => panic!("expected OperationAlreadyPending, got {:?}", other),
        }
    }

    #[test]
    fn executed_operation_is_immutable_and_pair_can_be_rescheduled() {
        let mut queue = GovernanceQueue::new();
        let first = queue.schedule(addr(1), SEL, OperationKind::Add, 0, DELAY).unwrap().id;
        queue.mark_executed(addr(1), SEL, addr(9), DELAY + 1).unwrap();

        assert!(!queue.is_pending(first));
        assert!(matches!(
            queue.mark_executed(addr(1), SEL, addr(9), DELAY + 2),
            Err(RegistryError::OperationNotPending { .. })
        ));
        assert_eq!(queue.get(first).unwrap().executed_by, Some(addr(9)));

        let second = queue.schedule(addr(1), SEL, OperationKind::Add, 500, DELAY).unwrap();
        assert_ne!(second.id, first);
        assert_eq!(second.generation, 1);
        assert_eq!(queue.get(first).unwrap().state, OperationState::Executed);
    }

    #[test]
    fn cancel_clears_pending_slot() {
        let mut queue = GovernanceQueue::new();
        let id = queue.schedule(addr(1), SEL, OperationKind::Remove, 0, DELAY).unwrap().id;
        queue.cancel(addr(1), SEL, 10).unwrap();

        assert_eq!(queue.get(id).unwrap().state, OperationState::Cancelled);
        assert!(queue.pending_for(addr(1), SEL).is_none());
        assert!(!queue.is_ready(id, DELAY + 1));
        assert!(matches!(
            queue.cancel(addr(1), SEL, 11),
            Err(RegistryError::OperationNotPending { .. })
        ));
        assert_eq!(queue.pending_count(), 0);
    }
}
