//! A stored integration configuration

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state_machine::InvalidTransition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigEntryState {
    #[default]
    NotLoaded,
    SetupInProgress,
    Loaded,
    /// Setup returned an error; may be retried
    SetupError,
    UnloadInProgress,
    FailedUnload,
}

impl ConfigEntryState {
    /// Whether `unload` may start from here
    pub fn can_unload(self) -> bool {
        matches!(self, ConfigEntryState::Loaded | ConfigEntryState::SetupError)
    }
}

/// Which flow created the entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigEntrySource {
    #[default]
    User,
    Zeroconf,
}

/// One configured instance of an integration, e.g. one Music Assistant server
///
/// `data` holds what the config flow collected and `options` what the
/// options flow changed afterwards. Lifecycle state lives only in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: String,
    pub domain: String,
    pub title: String,
    #[serde(default)]
    pub data: HashMap<String, Value>,
    #[serde(default)]
    pub options: HashMap<String, Value>,
    /// Identity of the configured thing; at most one entry per domain has it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub source: ConfigEntrySource,
    #[serde(skip)]
    pub state: ConfigEntryState,
    /// Why setup or unload failed
    #[serde(skip)]
    pub reason: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl ConfigEntry {
    pub fn new(domain: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            entry_id: ulid::Ulid::new().to_string(),
            domain: domain.into(),
            title: title.into(),
            data: HashMap::new(),
            options: HashMap::new(),
            unique_id: None,
            source: ConfigEntrySource::default(),
            state: ConfigEntryState::default(),
            reason: None,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn with_data(mut self, data: HashMap<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_options(mut self, options: HashMap<String, Value>) -> Self {
        self.options = options;
        self
    }

    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    pub fn with_source(mut self, source: ConfigEntrySource) -> Self {
        self.source = source;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.state == ConfigEntryState::Loaded
    }

    pub(crate) fn move_to(
        &mut self,
        state: ConfigEntryState,
        reason: Option<String>,
    ) -> Result<(), InvalidTransition> {
        self.state = self.state.try_transition(state)?;
        self.reason = reason;
        Ok(())
    }

    fn apply(&mut self, update: ConfigEntryUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(data) = update.data {
            self.data = data;
        }
        if let Some(options) = update.options {
            self.options = options;
        }
        self.modified_at = Utc::now();
    }
}

/// Partial change to an entry; unset fields are kept
#[derive(Debug, Default)]
pub struct ConfigEntryUpdate {
    title: Option<String>,
    data: Option<HashMap<String, Value>>,
    options: Option<HashMap<String, Value>>,
}

impl ConfigEntryUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn data(mut self, data: HashMap<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn options(mut self, options: HashMap<String, Value>) -> Self {
        self.options = Some(options);
        self
    }

    pub(crate) fn apply_to(self, entry: &mut ConfigEntry) {
        entry.apply(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_is_not_persisted() {
        let mut entry = ConfigEntry::new("music_assistant", "Music Assistant")
            .with_unique_id("abc123")
            .with_source(ConfigEntrySource::Zeroconf);
        entry.move_to(ConfigEntryState::SetupInProgress, None).unwrap();
        entry
            .move_to(ConfigEntryState::SetupError, Some("refused".into()))
            .unwrap();

        let stored = serde_json::to_value(&entry).unwrap();
        assert!(stored.get("state").is_none());
        assert_eq!(stored["source"], json!("zeroconf"));

        let parsed: ConfigEntry = serde_json::from_value(stored).unwrap();
        assert_eq!(parsed.state, ConfigEntryState::NotLoaded);
        assert_eq!(parsed.reason, None);
        assert_eq!(parsed.unique_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_invalid_move_keeps_state() {
        let mut entry = ConfigEntry::new("music_assistant", "Music Assistant");
        assert!(entry.move_to(ConfigEntryState::Loaded, None).is_err());
        assert_eq!(entry.state, ConfigEntryState::NotLoaded);
    }

    #[test]
    fn test_update_only_touches_set_fields() {
        let mut entry = ConfigEntry::new("music_assistant", "Music Assistant")
            .with_data(HashMap::from([("host".to_string(), json!("mass.local"))]));
        let before = entry.modified_at;

        ConfigEntryUpdate::new()
            .options(HashMap::from([("power_controls".to_string(), json!([]))]))
            .apply_to(&mut entry);

        assert_eq!(entry.title, "Music Assistant");
        assert_eq!(entry.data["host"], json!("mass.local"));
        assert!(entry.options.contains_key("power_controls"));
        assert!(entry.modified_at >= before);
    }
}
