// upgrade.rs — Versioned executor storage and logic migrations.
//
// The executor keeps a stable address while its logic is replaced. What
// survives a replacement is `ExecutorStorage`; a new logic version brings a
// `StorageMigration` that rewrites the record from its layout version to the
// next one.
//
// The persisted fields (owner, pending owner, registry pointer, pause flag)
// must mean the same thing after every migration. `apply_migration` checks
// that the migration left them untouched. New layouts add their fields under
// `extensions`.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use vg_core::{Ownership, PauseFlag};

use crate::error::UpgradeError;

/// Layout version written by this release.
pub const CURRENT_LAYOUT_VERSION: u32 = 1;

/// Everything the executor persists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutorStorage {
    pub layout_version: u32,

    #[serde(flatten)]
    pub ownership: Ownership,

    pub registry: Address,

    #[serde(default)]
    pub paused: PauseFlag,

    /// Fields introduced by later layouts, keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl ExecutorStorage {
    pub fn new(owner: Address, registry: Address) -> Self {
        Self {
            layout_version: CURRENT_LAYOUT_VERSION,
            ownership: Ownership::new(owner),
            registry,
            paused: PauseFlag::default(),
            extensions: BTreeMap::new(),
        }
    }
}

/// Rewrites executor storage from one layout version to the next.
pub trait StorageMigration {
    fn from_version(&self) -> u32;

    fn to_version(&self) -> u32;

    /// Produce the storage for `to_version`. Must set `layout_version`
    /// accordingly and leave the persisted fields alone.
    fn migrate(&self, storage: ExecutorStorage) -> Result<ExecutorStorage, UpgradeError>;
}

/// A migration that only moves the version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionBump {
    pub from: u32,
    pub to: u32,
}

impl StorageMigration for VersionBump {
    fn from_version(&self) -> u32 {
        self.from
    }

    fn to_version(&self) -> u32 {
        self.to
    }

    fn migrate(&self, mut storage: ExecutorStorage) -> Result<ExecutorStorage, UpgradeError> {
        storage.layout_version = self.to;
        Ok(storage)
    }
}

/// Run `migration` against `storage` and verify the result.
pub fn apply_migration(
    storage: &ExecutorStorage,
    migration: &dyn StorageMigration,
) -> Result<ExecutorStorage, UpgradeError> {
    let (from, to) = (migration.from_version(), migration.to_version());
    if from != storage.layout_version {
        return Err(UpgradeError::VersionMismatch {
            current: storage.layout_version,
            migration_from: from,
        });
    }
    if to <= from {
        return Err(UpgradeError::NotForward { from, to });
    }

    let migrated = migration.migrate(storage.clone())?;
    if migrated.layout_version != to {
        return Err(UpgradeError::StorageLayoutViolation {
            field: "layout_version",
        });
    }
    ensure_preserved(storage, &migrated)?;
    Ok(migrated)
}

fn ensure_preserved(before: &ExecutorStorage, after: &ExecutorStorage) -> Result<(), UpgradeError> {
    let checks = [
        ("owner", before.ownership.owner() == after.ownership.owner()),
        (
            "pending_owner",
            before.ownership.pending_owner() == after.ownership.pending_owner(),
        ),
        ("registry", before.registry == after.registry),
        ("paused", before.paused == after.paused),
    ];
    match checks.into_iter().find(|(_, preserved)| !preserved) {
        Some((field, _)) => Err(UpgradeError::StorageLayoutViolation { field }),
        None => Ok(()),
    }
}
