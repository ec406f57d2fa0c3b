//! Entry lifecycle rules
//!
//! ```text
//! NotLoaded ──► SetupInProgress ──► Loaded ──► UnloadInProgress ──► NotLoaded
//!                    ▲     │                          ▲      │
//!                    │     ▼                          │      ▼
//!                    └─ SetupError ───────────────────┘   FailedUnload
//! ```
//!
//! `FailedUnload` has no way out; the hub has to restart.

use crate::entry::ConfigEntryState;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("config entry cannot go from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: ConfigEntryState,
    pub to: ConfigEntryState,
}

impl ConfigEntryState {
    /// States reachable in one step
    pub fn successors(self) -> &'static [ConfigEntryState] {
        use ConfigEntryState::*;
        match self {
            NotLoaded => &[SetupInProgress],
            SetupInProgress => &[Loaded, SetupError],
            Loaded => &[UnloadInProgress],
            SetupError => &[SetupInProgress, UnloadInProgress],
            UnloadInProgress => &[NotLoaded, FailedUnload],
            FailedUnload => &[],
        }
    }

    pub fn try_transition(self, to: ConfigEntryState) -> Result<ConfigEntryState, InvalidTransition> {
        if self.successors().contains(&to) {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }
}
