//! Config and options flows
//!
//! The config flow creates an entry either from host details the user types
//! in or from a zeroconf announcement the user confirms. Credentials are
//! checked by connecting once before the entry is created. The options flow
//! picks which candidate player controls get registered.

use std::collections::HashMap;
use std::sync::Arc;

use ha_config_entries::{
    ConfigEntries, ConfigEntriesError, ConfigEntry, ConfigEntrySource, ConfigEntryUpdate,
    FlowResult, FormField,
};
use ha_hub::Hub;
use mass_client::{ClientFactory, PlayerControlType, ServerConfig, DEFAULT_PORT, DEFAULT_USERNAME};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{options_for_controls, server_config_from_data, server_config_to_data};
use crate::consts::{CONF_POWER_CONTROL_ENTITIES, CONF_VOLUME_CONTROL_ENTITIES, DEFAULT_NAME, DOMAIN};
use crate::error::{MassError, MassResult};
use crate::player_controls::control_candidates;

pub type FlowInput = HashMap<String, Value>;

/// Connect once with `config` and close again
///
/// Rejected credentials and unreachable servers both come back as
/// [`MassError::InvalidAuth`].
pub async fn authenticate(factory: &dyn ClientFactory, config: &ServerConfig) -> MassResult<()> {
    let client = factory.create(config);
    client.connect(false).await.map_err(|e| {
        if e.is_auth_failure() {
            MassError::InvalidAuth
        } else {
            MassError::Client(e)
        }
    })?;
    client.close().await?;
    Ok(())
}

/// Properties of a zeroconf announcement
#[derive(Debug, Clone, Deserialize)]
pub struct ZeroconfInfo {
    pub properties: HashMap<String, Value>,
}

impl ZeroconfInfo {
    fn property(&self, key: &str) -> MassResult<String> {
        match self.properties.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(MassError::InvalidConfig(format!(
                "discovery info is missing {}",
                key
            ))),
        }
    }
}

#[derive(Debug, Clone)]
struct Discovered {
    unique_id: String,
    host: String,
    port: u16,
}

/// One run of the config flow
pub struct MassConfigFlow {
    factory: Arc<dyn ClientFactory>,
    entries: Arc<ConfigEntries>,
    unique_id: Option<String>,
    discovered: Option<Discovered>,
}

impl MassConfigFlow {
    pub fn new(factory: Arc<dyn ClientFactory>, entries: Arc<ConfigEntries>) -> Self {
        Self {
            factory,
            entries,
            unique_id: None,
            discovered: None,
        }
    }

    fn user_schema() -> Vec<FormField> {
        vec![
            FormField::required("host", "string"),
            FormField::optional("port", "integer", json!(DEFAULT_PORT)),
            FormField::optional("username", "string", json!(DEFAULT_USERNAME)),
            FormField::optional("password", "string", json!("")),
            FormField::optional("ssl", "boolean", json!(false)),
        ]
    }

    fn discovery_schema() -> Vec<FormField> {
        vec![
            FormField::optional("username", "string", json!(DEFAULT_USERNAME)),
            FormField::optional("password", "string", json!("")),
        ]
    }

    /// Host details typed in by the user
    pub async fn step_user(&mut self, input: Option<FlowInput>) -> MassResult<FlowResult> {
        let Some(input) = input else {
            return Ok(FlowResult::form(DOMAIN, "user", Self::user_schema(), HashMap::new()));
        };

        let config = match server_config_from_data(&input) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Rejected server settings");
                return Ok(Self::user_form_with_error(&e));
            }
        };
        self.unique_id = Some(config.host.clone());

        match authenticate(self.factory.as_ref(), &config).await {
            Ok(()) => self.create_entry(&config, ConfigEntrySource::User).await,
            Err(e) => {
                warn!(host = %config.host, error = %e, "Authentication failed");
                Ok(Self::user_form_with_error(&e))
            }
        }
    }

    fn user_form_with_error(error: &MassError) -> FlowResult {
        let errors = HashMap::from([("base".to_string(), error.flow_error_key().to_string())]);
        FlowResult::form(DOMAIN, "user", Self::user_schema(), errors)
    }

    /// A server announced itself over zeroconf
    ///
    /// A server that is already configured gets its host and port refreshed
    /// and the flow aborts.
    pub async fn step_zeroconf(&mut self, info: ZeroconfInfo) -> MassResult<FlowResult> {
        let unique_id = info.property("id")?;
        let host = info.property("host")?;
        let port = info
            .property("http_port")?
            .parse::<u16>()
            .map_err(|e| MassError::InvalidConfig(format!("invalid http_port: {}", e)))?;

        if let Some(existing) = self.entries.get_by_unique_id(DOMAIN, &unique_id) {
            let mut data = existing.data.clone();
            data.insert("host".to_string(), json!(host));
            data.insert("port".to_string(), json!(port));
            self.entries
                .update(&existing.entry_id, ConfigEntryUpdate::new().data(data))
                .await?;
            debug!(unique_id = %unique_id, "Updated discovered server address");
            return Ok(FlowResult::abort(DOMAIN, "already_configured"));
        }

        self.unique_id = Some(unique_id.clone());
        self.discovered = Some(Discovered {
            unique_id,
            host,
            port,
        });
        self.step_discovery_confirm(None).await
    }

    /// User confirmation of a discovered server, with credentials
    pub async fn step_discovery_confirm(&mut self, input: Option<FlowInput>) -> MassResult<FlowResult> {
        let discovered = self
            .discovered
            .clone()
            .ok_or_else(|| MassError::InvalidConfig("no discovered server".to_string()))?;

        let mut errors = HashMap::new();
        if let Some(input) = input {
            let mut config = ServerConfig::new(&discovered.host);
            config.port = discovered.port;
            if let Some(username) = input.get("username").and_then(Value::as_str) {
                config.username = username.to_string();
            }
            if let Some(password) = input.get("password").and_then(Value::as_str) {
                config.password = password.to_string();
            }

            match authenticate(self.factory.as_ref(), &config).await {
                Ok(()) => return self.create_entry(&config, ConfigEntrySource::Zeroconf).await,
                Err(e) => {
                    warn!(host = %config.host, error = %e, "Authentication failed");
                    errors.insert("base".to_string(), e.flow_error_key().to_string());
                }
            }
        }

        Ok(
            FlowResult::form(DOMAIN, "discovery_confirm", Self::discovery_schema(), errors)
                .with_placeholder("name", discovered.unique_id),
        )
    }

    async fn create_entry(
        &self,
        config: &ServerConfig,
        source: ConfigEntrySource,
    ) -> MassResult<FlowResult> {
        let data = server_config_to_data(config);
        let mut entry = ConfigEntry::new(DOMAIN, DEFAULT_NAME)
            .with_data(data.clone())
            .with_source(source);
        if let Some(unique_id) = &self.unique_id {
            entry = entry.with_unique_id(unique_id.clone());
        }

        match self.entries.add(entry).await {
            Ok(entry) => {
                info!(entry_id = %entry.entry_id, host = %config.host, "Created Music Assistant entry");
                Ok(FlowResult::create_entry(DOMAIN, DEFAULT_NAME, data))
            }
            Err(ConfigEntriesError::AlreadyExists { .. }) => {
                Ok(FlowResult::abort(DOMAIN, "already_configured"))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Options flow of one entry
pub struct MassOptionsFlow {
    hub: Hub,
    entries: Arc<ConfigEntries>,
    entry_id: String,
}

impl MassOptionsFlow {
    pub fn new(hub: Hub, entries: Arc<ConfigEntries>, entry_id: impl Into<String>) -> Self {
        Self {
            hub,
            entries,
            entry_id: entry_id.into(),
        }
    }

    /// Show the control pickers, or store the picked controls
    pub async fn step_init(&self, input: Option<FlowInput>) -> MassResult<FlowResult> {
        let entry = self
            .entries
            .get(&self.entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(self.entry_id.clone()))?;

        if let Some(input) = input {
            let power = selected(&input, CONF_POWER_CONTROL_ENTITIES);
            let volume = selected(&input, CONF_VOLUME_CONTROL_ENTITIES);
            let options = options_for_controls(&power, &volume);
            self.entries
                .update(&self.entry_id, ConfigEntryUpdate::new().options(options.clone()))
                .await?;
            return Ok(FlowResult::create_entry(DOMAIN, "", options));
        }

        let mut power_choices = Vec::new();
        let mut volume_choices = Vec::new();
        for control in control_candidates(&self.hub.states) {
            let choice = (control.control_id.clone(), control.label());
            match control.control_type {
                PlayerControlType::Power => power_choices.push(choice),
                PlayerControlType::Volume => volume_choices.push(choice),
            }
        }

        let schema = vec![
            FormField::multi_select(
                CONF_POWER_CONTROL_ENTITIES,
                power_choices,
                selected(&entry.options, CONF_POWER_CONTROL_ENTITIES),
            ),
            FormField::multi_select(
                CONF_VOLUME_CONTROL_ENTITIES,
                volume_choices,
                selected(&entry.options, CONF_VOLUME_CONTROL_ENTITIES),
            ),
        ];
        Ok(FlowResult::form(DOMAIN, "init", schema, HashMap::new()))
    }
}

fn selected(values: &HashMap<String, Value>, key: &str) -> Vec<String> {
    values
        .get(key)
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}
