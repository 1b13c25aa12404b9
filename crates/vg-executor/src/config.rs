// config.rs — Executor deployment configuration.
//
// ```toml
// owner = "0x00000000000000000000000000000000000000a0"
// registry = "0x00000000000000000000000000000000000000ee"
// ```

use std::fs;
use std::path::Path;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::ExecutorError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Administrator of the executor: pause, registry pointer, upgrades.
    pub owner: Address,

    /// Address of the registry batches are checked against.
    pub registry: Address,
}

impl ExecutorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ExecutorError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExecutorError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ExecutorError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_addresses() {
        let config = ExecutorConfig::from_toml_str(
            r#"
            owner = "0x00000000000000000000000000000000000000a0"
            registry = "0x00000000000000000000000000000000000000ee"
            "#,
        )
        .unwrap();
        assert_eq!(config.owner, Address::with_last_byte(0xa0));
        assert_eq!(config.registry, Address::with_last_byte(0xee));
    }

    #[test]
    fn missing_registry_is_rejected() {
        let result =
            ExecutorConfig::from_toml_str(r#"owner = "0x00000000000000000000000000000000000000a0""#);
        assert!(matches!(result, Err(ExecutorError::ConfigParse(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ExecutorConfig::load(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ExecutorError::IoError { .. })));
    }
}
