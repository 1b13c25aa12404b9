// execution.rs — One unit of a guarded batch.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// A call to forward on behalf of the custodial account: target, native
/// value, and the raw invocation payload (selector followed by arguments).
///
/// Batches are ordered `Vec<Execution>`; order is preserved during dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Execution {
    pub target: Address,
    #[serde(default)]
    pub value: U256,
    pub payload: Bytes,
}

impl Execution {
    pub fn new(target: Address, value: U256, payload: impl Into<Bytes>) -> Self {
        Self {
            target,
            value,
            payload: payload.into(),
        }
    }

    /// A call that carries no native value.
    pub fn call(target: Address, payload: impl Into<Bytes>) -> Self {
        Self::new(target, U256::ZERO, payload)
    }
}
