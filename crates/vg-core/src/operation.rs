// operation.rs — The two kinds of allow-list change.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether an allow-list change adds or removes a (target, selector) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Add,
    Remove,
}

impl OperationKind {
    /// Stable one-byte tag used when deriving operation identifiers.
    pub fn tag(self) -> u8 {
        match self {
            OperationKind::Add => 1,
            OperationKind::Remove => 2,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Add => write!(f, "add"),
            OperationKind::Remove => write!(f, "remove"),
        }
    }
}
