//! Entity states

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::consts::ATTR_FRIENDLY_NAME;
use crate::{Context, EntityId};

/// Snapshot of one entity
///
/// `state` is the short string value ("on", "playing", ...). Everything else
/// lives in `attributes`. Equality ignores timestamps and context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub entity_id: EntityId,
    pub state: String,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    /// Last time `state` took a different value
    pub last_changed: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub context: Context,
}

impl State {
    pub fn new(
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: HashMap<String, Value>,
        context: Context,
    ) -> Self {
        let now = Utc::now();
        Self {
            entity_id,
            state: state.into(),
            attributes,
            last_changed: now,
            last_updated: now,
            context,
        }
    }

    /// The state that replaces this one after a write
    pub fn with_update(
        &self,
        state: impl Into<String>,
        attributes: HashMap<String, Value>,
        context: Context,
    ) -> Self {
        let mut next = State::new(self.entity_id.clone(), state, attributes, context);
        if next.state == self.state {
            next.last_changed = self.last_changed;
        }
        next
    }

    pub fn domain(&self) -> &str {
        self.entity_id.domain()
    }

    /// `friendly_name`, else the object id with underscores as spaces
    pub fn name(&self) -> String {
        match self.attributes.get(ATTR_FRIENDLY_NAME) {
            Some(Value::String(name)) => name.clone(),
            _ => self.entity_id.object_id().replace('_', " "),
        }
    }

    pub fn attribute<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.attributes.get(key)?;
        T::deserialize(value).ok()
    }

    /// Present and truthy: null, false, 0, "" and empty collections do not count
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.get(key).is_some_and(|value| match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64() != Some(0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
        })
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        (&self.entity_id, &self.state, &self.attributes)
            == (&other.entity_id, &other.state, &other.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(entity_id: &str, value: &str, attributes: &[(&str, Value)]) -> State {
        let attributes = attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        State::new(entity_id.parse().unwrap(), value, attributes, Context::new())
    }

    #[test]
    fn test_name() {
        let named = state("media_player.tv", "on", &[("friendly_name", json!("Living Room TV"))]);
        assert_eq!(named.name(), "Living Room TV");
        assert_eq!(state("switch.coffee_maker", "off", &[]).name(), "coffee maker");
    }

    #[test]
    fn test_last_changed_follows_value() {
        let first = state("switch.kitchen", "on", &[]);
        let same = first.with_update("on", HashMap::new(), Context::new());
        assert_eq!(first.last_changed, same.last_changed);
        assert!(same.last_updated >= first.last_updated);

        let changed = first.with_update("off", HashMap::new(), Context::new());
        assert_eq!(changed.state, "off");
        assert!(changed.last_changed >= first.last_changed);
    }

    #[test]
    fn test_truthy_attributes() {
        let s = state(
            "media_player.tv",
            "on",
            &[
                ("mass_player_id", json!("abc")),
                ("empty", json!("")),
                ("nothing", json!(null)),
                ("sources", json!([])),
                ("volume", json!(0)),
            ],
        );
        assert!(s.has_attribute("mass_player_id"));
        for key in ["empty", "nothing", "sources", "volume", "missing"] {
            assert!(!s.has_attribute(key), "{key}");
        }
    }

    #[test]
    fn test_typed_attribute() {
        let s = state(
            "media_player.tv",
            "on",
            &[
                ("volume_level", json!(0.35)),
                ("source_list", json!(["HDMI1", "HDMI2"])),
            ],
        );
        assert_eq!(s.attribute::<f64>("volume_level"), Some(0.35));
        assert_eq!(
            s.attribute::<Vec<String>>("source_list"),
            Some(vec!["HDMI1".to_string(), "HDMI2".to_string()])
        );
        assert_eq!(s.attribute::<String>("volume_level"), None);
    }
}
