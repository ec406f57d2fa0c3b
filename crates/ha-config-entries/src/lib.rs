//! Config entries
//!
//! A config entry is one persisted, user-approved configuration of an
//! integration, such as one Music Assistant server. This crate stores the
//! entries, walks them through setup and unload via per-domain
//! [`IntegrationHandler`]s and defines the [`FlowResult`] shape that config
//! and options flows answer with.

pub mod entry;
pub mod flow;
pub mod manager;
pub mod state_machine;
pub mod storage;

pub use entry::{ConfigEntry, ConfigEntrySource, ConfigEntryState, ConfigEntryUpdate};
pub use flow::{FlowResult, FlowResultType, FormField};
pub use manager::{
    ConfigEntries, ConfigEntriesData, ConfigEntriesError, ConfigEntriesResult,
    IntegrationHandler, STORAGE_KEY, STORAGE_VERSION,
};
pub use state_machine::InvalidTransition;
pub use storage::{Storage, StorageError, StorageResult, StorageVersion};
