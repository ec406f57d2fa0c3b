//! Config entry data and options

use std::collections::{HashMap, HashSet};

use ha_config_entries::ConfigEntry;
use mass_client::ServerConfig;
use serde_json::Value;

use crate::consts::{CONF_POWER_CONTROL_ENTITIES, CONF_VOLUME_CONTROL_ENTITIES};
use crate::error::{MassError, MassResult};
use crate::player_controls::ControlFilter;

/// Everything a config entry tells the integration
#[derive(Debug, Clone, PartialEq)]
pub struct MassConfig {
    pub server: ServerConfig,
    pub controls: ControlFilter,
}

impl MassConfig {
    pub fn from_entry(entry: &ConfigEntry) -> MassResult<Self> {
        Ok(Self {
            server: server_config_from_data(&entry.data)?,
            controls: control_filter_from_options(&entry.options),
        })
    }
}

/// Parse connection parameters from entry (or form) data
pub fn server_config_from_data(data: &HashMap<String, Value>) -> MassResult<ServerConfig> {
    let object: serde_json::Map<String, Value> =
        data.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    serde_json::from_value(Value::Object(object))
        .map_err(|e| MassError::InvalidConfig(e.to_string()))
}

/// Entry data stored for a server config
pub fn server_config_to_data(config: &ServerConfig) -> HashMap<String, Value> {
    match serde_json::to_value(config) {
        Ok(Value::Object(object)) => object.into_iter().collect(),
        _ => HashMap::new(),
    }
}

fn id_list(options: &HashMap<String, Value>, key: &str) -> Option<HashSet<String>> {
    let list = options.get(key)?.as_array()?;
    Some(
        list.iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
    )
}

/// Build the control filter from entry options
///
/// Without either option list every candidate is enabled.
pub fn control_filter_from_options(options: &HashMap<String, Value>) -> ControlFilter {
    let power = id_list(options, CONF_POWER_CONTROL_ENTITIES);
    let volume = id_list(options, CONF_VOLUME_CONTROL_ENTITIES);
    if power.is_none() && volume.is_none() {
        return ControlFilter::All;
    }
    ControlFilter::Only(power.into_iter().chain(volume).flatten().collect())
}

/// Options map selecting exactly the given controls
pub fn options_for_controls(power: &[String], volume: &[String]) -> HashMap<String, Value> {
    HashMap::from([
        (CONF_POWER_CONTROL_ENTITIES.to_string(), serde_json::json!(power)),
        (CONF_VOLUME_CONTROL_ENTITIES.to_string(), serde_json::json!(volume)),
    ])
}
