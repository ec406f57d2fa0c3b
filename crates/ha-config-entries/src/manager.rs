//! The config entry registry
//!
//! [`ConfigEntries`] owns every entry, writes the whole set back to
//! `.storage/core.config_entries` after each change and runs setup and
//! unload through the [`IntegrationHandler`] registered for the entry's
//! domain.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::entry::{ConfigEntry, ConfigEntryState, ConfigEntryUpdate};
use crate::state_machine::InvalidTransition;
use crate::storage::{Storage, StorageError, StorageResult, StorageVersion};

pub const STORAGE_KEY: &str = "core.config_entries";
pub const STORAGE_VERSION: StorageVersion = StorageVersion { major: 1, minor: 1 };

#[derive(Debug, Error)]
pub enum ConfigEntriesError {
    #[error("config entry {0} not found")]
    NotFound(String),

    #[error("{domain} already has an entry with unique_id {unique_id}")]
    AlreadyExists { domain: String, unique_id: String },

    #[error("config entry cannot be unloaded while {0:?}")]
    CannotUnload(ConfigEntryState),

    #[error("setup failed: {0}")]
    SetupFailed(String),

    #[error("unload failed: {0}")]
    UnloadFailed(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type ConfigEntriesResult<T> = Result<T, ConfigEntriesError>;

/// Shape of the persisted document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigEntriesData {
    pub entries: Vec<ConfigEntry>,
}

/// Setup and teardown of one integration domain's entries
///
/// An error message returned here becomes the entry's `reason`.
#[async_trait]
pub trait IntegrationHandler: Send + Sync {
    async fn setup_entry(&self, entry: &ConfigEntry) -> Result<(), String>;

    async fn unload_entry(&self, entry: &ConfigEntry) -> Result<(), String>;
}

pub struct ConfigEntries {
    storage: Arc<Storage>,
    entries: DashMap<String, ConfigEntry>,
    /// (domain, unique_id) -> entry_id
    unique_ids: DashMap<(String, String), String>,
    handlers: DashMap<String, Arc<dyn IntegrationHandler>>,
    /// One setup or unload at a time
    lifecycle: Mutex<()>,
}

impl ConfigEntries {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            entries: DashMap::new(),
            unique_ids: DashMap::new(),
            handlers: DashMap::new(),
            lifecycle: Mutex::new(()),
        }
    }

    /// Read persisted entries; all of them start out not loaded
    pub async fn load(&self) -> StorageResult<()> {
        let stored: Option<ConfigEntriesData> =
            self.storage.read(STORAGE_KEY, STORAGE_VERSION).await?;
        let entries = stored.unwrap_or_default().entries;
        info!(count = entries.len(), "Loaded config entries");
        for entry in entries {
            self.insert(entry);
        }
        Ok(())
    }

    pub async fn save(&self) -> StorageResult<()> {
        let mut entries: Vec<ConfigEntry> = self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by_key(|e| e.created_at);
        self.storage
            .write(STORAGE_KEY, STORAGE_VERSION, &ConfigEntriesData { entries })
            .await
    }

    fn insert(&self, entry: ConfigEntry) {
        if let Some(unique_id) = &entry.unique_id {
            self.unique_ids.insert(
                (entry.domain.clone(), unique_id.clone()),
                entry.entry_id.clone(),
            );
        }
        self.entries.insert(entry.entry_id.clone(), entry);
    }

    fn take(&self, entry_id: &str) -> Option<ConfigEntry> {
        let (_, entry) = self.entries.remove(entry_id)?;
        if let Some(unique_id) = &entry.unique_id {
            self.unique_ids
                .remove(&(entry.domain.clone(), unique_id.clone()));
        }
        Some(entry)
    }

    pub fn get(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.entries.get(entry_id).map(|e| e.value().clone())
    }

    fn require(&self, entry_id: &str) -> ConfigEntriesResult<ConfigEntry> {
        self.get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))
    }

    /// Entries of one domain, oldest first
    pub fn get_by_domain(&self, domain: &str) -> Vec<ConfigEntry> {
        let mut entries: Vec<ConfigEntry> = self
            .entries
            .iter()
            .filter(|e| e.domain == domain)
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by_key(|e| e.created_at);
        entries
    }

    pub fn get_by_unique_id(&self, domain: &str, unique_id: &str) -> Option<ConfigEntry> {
        let entry_id = self
            .unique_ids
            .get(&(domain.to_string(), unique_id.to_string()))?
            .value()
            .clone();
        self.get(&entry_id)
    }

    /// Store a new entry; a unique id may only be used once per domain
    #[instrument(skip(self, entry), fields(domain = %entry.domain, entry_id = %entry.entry_id))]
    pub async fn add(&self, entry: ConfigEntry) -> ConfigEntriesResult<ConfigEntry> {
        if let Some(unique_id) = &entry.unique_id {
            if self.get_by_unique_id(&entry.domain, unique_id).is_some() {
                return Err(ConfigEntriesError::AlreadyExists {
                    domain: entry.domain.clone(),
                    unique_id: unique_id.clone(),
                });
            }
        }

        self.insert(entry.clone());
        self.save().await?;
        info!(title = %entry.title, "Added config entry");
        Ok(entry)
    }

    /// Change title, data or options of a stored entry
    pub async fn update(
        &self,
        entry_id: &str,
        update: ConfigEntryUpdate,
    ) -> ConfigEntriesResult<ConfigEntry> {
        let updated = {
            let mut entry = self
                .entries
                .get_mut(entry_id)
                .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;
            update.apply_to(&mut entry);
            entry.clone()
        };
        self.save().await?;
        debug!(entry_id, "Updated config entry");
        Ok(updated)
    }

    /// Delete an entry, unloading it first if needed
    pub async fn remove(&self, entry_id: &str) -> ConfigEntriesResult<ConfigEntry> {
        if self.require(entry_id)?.state.can_unload() {
            self.unload(entry_id).await?;
        }
        let entry = self
            .take(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;
        self.save().await?;
        info!(entry_id, domain = %entry.domain, "Removed config entry");
        Ok(entry)
    }

    fn move_to(
        &self,
        entry_id: &str,
        state: ConfigEntryState,
        reason: Option<String>,
    ) -> ConfigEntriesResult<()> {
        let mut entry = self
            .entries
            .get_mut(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;
        entry.move_to(state, reason)?;
        debug!(entry_id, ?state, "Config entry state changed");
        Ok(())
    }

    pub fn register_handler(&self, domain: &str, handler: Arc<dyn IntegrationHandler>) {
        debug!(domain, "Registered integration handler");
        self.handlers.insert(domain.to_string(), handler);
    }

    fn handler(&self, domain: &str) -> Option<Arc<dyn IntegrationHandler>> {
        self.handlers.get(domain).map(|h| h.value().clone())
    }

    /// Run the domain's setup for an entry
    ///
    /// Entries of a domain nobody handles are simply marked loaded.
    #[instrument(skip(self))]
    pub async fn setup(&self, entry_id: &str) -> ConfigEntriesResult<()> {
        let _guard = self.lifecycle.lock().await;
        let entry = self.require(entry_id)?;
        self.move_to(entry_id, ConfigEntryState::SetupInProgress, None)?;

        let outcome = match self.handler(&entry.domain) {
            Some(handler) => handler.setup_entry(&entry).await,
            None => Ok(()),
        };
        match outcome {
            Ok(()) => {
                self.move_to(entry_id, ConfigEntryState::Loaded, None)?;
                info!(domain = %entry.domain, "Config entry loaded");
                Ok(())
            }
            Err(reason) => {
                warn!(domain = %entry.domain, %reason, "Config entry setup failed");
                self.move_to(entry_id, ConfigEntryState::SetupError, Some(reason.clone()))?;
                Err(ConfigEntriesError::SetupFailed(reason))
            }
        }
    }

    /// Run the domain's unload for an entry; a no-op if it is not loaded
    #[instrument(skip(self))]
    pub async fn unload(&self, entry_id: &str) -> ConfigEntriesResult<()> {
        let _guard = self.lifecycle.lock().await;
        let entry = self.require(entry_id)?;
        match entry.state {
            ConfigEntryState::NotLoaded => return Ok(()),
            state if !state.can_unload() => return Err(ConfigEntriesError::CannotUnload(state)),
            _ => {}
        }
        self.move_to(entry_id, ConfigEntryState::UnloadInProgress, None)?;

        let outcome = match self.handler(&entry.domain) {
            Some(handler) => handler.unload_entry(&entry).await,
            None => Ok(()),
        };
        match outcome {
            Ok(()) => {
                self.move_to(entry_id, ConfigEntryState::NotLoaded, None)?;
                info!(domain = %entry.domain, "Config entry unloaded");
                Ok(())
            }
            Err(reason) => {
                warn!(domain = %entry.domain, %reason, "Config entry unload failed");
                self.move_to(entry_id, ConfigEntryState::FailedUnload, Some(reason.clone()))?;
                Err(ConfigEntriesError::UnloadFailed(reason))
            }
        }
    }

    /// Unload and set up again, e.g. after the options changed
    pub async fn reload(&self, entry_id: &str) -> ConfigEntriesResult<()> {
        self.unload(entry_id).await?;
        self.setup(entry_id).await
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
