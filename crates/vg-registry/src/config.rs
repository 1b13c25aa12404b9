// config.rs — Registry deployment configuration.
//
// Two choices are fixed when a registry is deployed:
//
// - how allow-list changes are governed: applied immediately by the owner,
//   or scheduled and finalized after a timelock delay (mutually exclusive);
// - which tokens the recipient authorization rules apply to.
//
// Configs are plain serde structs so they can be loaded from TOML:
//
// ```toml
// recipient_scope = "allowed_tokens_only"
//
// [governance]
// mode = "timelocked"
// delay_secs = 172800
// ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Default timelock delay: two days.
pub const DEFAULT_TIMELOCK_DELAY_SECS: u64 = 2 * 24 * 60 * 60;

/// How allow-list changes are applied.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GovernanceMode {
    /// The owner adds and removes entries directly.
    #[default]
    Immediate,
    /// The owner schedules changes; anyone finalizes them once `delay_secs`
    /// have fully elapsed.
    Timelocked {
        #[serde(default = "default_delay")]
        delay_secs: u64,
    },
}

fn default_delay() -> u64 {
    DEFAULT_TIMELOCK_DELAY_SECS
}

/// Which tokens the recipient authorization rules apply to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecipientScope {
    /// Every token transfer is checked.
    #[default]
    AllTokens,
    /// Only tokens the owner marked as allowed are checked; transfers of any
    /// other token are unrestricted.
    AllowedTokensOnly,
}

/// Registry deployment configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryConfig {
    #[serde(default)]
    pub governance: GovernanceMode,

    #[serde(default)]
    pub recipient_scope: RecipientScope,
}

impl RegistryConfig {
    /// Immediate governance, every token checked.
    pub fn immediate() -> Self {
        Self::default()
    }

    /// Timelocked governance with the given delay.
    pub fn timelocked(delay_secs: u64) -> Self {
        Self {
            governance: GovernanceMode::Timelocked { delay_secs },
            ..Self::default()
        }
    }

    /// Set the recipient scope (builder pattern).
    pub fn with_recipient_scope(mut self, scope: RecipientScope) -> Self {
        self.recipient_scope = scope;
        self
    }

    /// The timelock delay, or `None` in immediate mode.
    pub fn timelock_delay(&self) -> Option<u64> {
        match self.governance {
            GovernanceMode::Immediate => None,
            GovernanceMode::Timelocked { delay_secs } => Some(delay_secs),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RegistryError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RegistryError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
