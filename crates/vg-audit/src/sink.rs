// sink.rs — Where policy events go.
//
// Components hold an `Arc<dyn EventSink>` and emit only after a call has
// succeeded. A failing sink never undoes a committed change: `emit` logs the
// failure and moves on.

use std::sync::Mutex;

use vg_core::Address;

use crate::error::AuditError;
use crate::event::{AuditRecord, GuardEvent};

/// Receives events from registry and executor instances.
pub trait EventSink: Send + Sync {
    fn record(&self, source: Address, event: GuardEvent) -> Result<(), AuditError>;
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _source: Address, _event: GuardEvent) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Keeps every record in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<GuardEvent> {
        self.records().into_iter().map(|r| r.event).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn record(&self, source: Address, event: GuardEvent) -> Result<(), AuditError> {
        self.records
            .lock()
            .map_err(|_| AuditError::LockPoisoned)?
            .push(AuditRecord::new(source, event));
        Ok(())
    }
}

/// Emit `event` on behalf of `source`, logging instead of failing.
pub fn emit(sink: &dyn EventSink, source: Address, event: GuardEvent) {
    let event_type = event.event_type();
    if let Err(error) = sink.record(source, event) {
        tracing::warn!(%source, event_type, %error, "failed to record policy event");
    }
}
