// pause.rs — Emergency stop flag.

use serde::{Deserialize, Serialize};

use crate::error::PauseError;

/// A pause flag with strict transitions: pausing a paused component and
/// unpausing a running one are both errors.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PauseFlag(bool);

impl PauseFlag {
    pub fn new(paused: bool) -> Self {
        Self(paused)
    }

    pub fn is_paused(&self) -> bool {
        self.0
    }

    /// Guard for mutating entry points.
    pub fn ensure_not_paused(&self) -> Result<(), PauseError> {
        if self.0 {
            Err(PauseError::EnforcedPause)
        } else {
            Ok(())
        }
    }

    pub fn pause(&mut self) -> Result<(), PauseError> {
        self.ensure_not_paused()?;
        self.0 = true;
        Ok(())
    }

    pub fn unpause(&mut self) -> Result<(), PauseError> {
        if !self.0 {
            return Err(PauseError::ExpectedPause);
        }
        self.0 = false;
        Ok(())
    }
}
