//! Current entity states

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use ha_core::events::StateChangedData;
use ha_core::{Context, EntityId, State};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::EventBus;

/// Latest [`State`] of every entity
///
/// Each write or removal fires `state_changed` with the old and new state.
pub struct StateMachine {
    states: DashMap<EntityId, State>,
    bus: Arc<EventBus>,
}

impl StateMachine {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            states: DashMap::new(),
            bus,
        }
    }

    #[instrument(skip(self, state, attributes, context), fields(entity_id = %entity_id))]
    pub fn set(
        &self,
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: HashMap<String, Value>,
        context: Context,
    ) -> State {
        let old_state = self.states.get(&entity_id).map(|s| s.clone());
        let new_state = match &old_state {
            Some(old) => old.with_update(state, attributes, context.clone()),
            None => State::new(entity_id.clone(), state, attributes, context.clone()),
        };
        debug!(state = %new_state.state, "State written");

        self.states.insert(entity_id.clone(), new_state.clone());
        self.bus.fire_typed(
            StateChangedData {
                entity_id,
                old_state,
                new_state: Some(new_state.clone()),
            },
            context,
        );
        new_state
    }

    /// State of `entity_id`; malformed ids simply have none
    pub fn get(&self, entity_id: &str) -> Option<State> {
        let id: EntityId = entity_id.parse().ok()?;
        self.states.get(&id).map(|s| s.clone())
    }

    /// States in any of `domains`, ordered by entity id
    pub fn all_in_domains(&self, domains: &[&str]) -> Vec<State> {
        let mut found: Vec<State> = self
            .states
            .iter()
            .filter(|entry| domains.iter().any(|d| *d == entry.key().domain()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        found
    }

    #[instrument(skip(self, context), fields(entity_id = %entity_id))]
    pub fn remove(&self, entity_id: &EntityId, context: Context) -> Option<State> {
        let (_, old_state) = self.states.remove(entity_id)?;
        debug!("State removed");

        self.bus.fire_typed(
            StateChangedData {
                entity_id: entity_id.clone(),
                old_state: Some(old_state.clone()),
                new_state: None,
            },
            context,
        );
        Some(old_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn machine() -> (Arc<EventBus>, StateMachine) {
        let bus = Arc::new(EventBus::new());
        (bus.clone(), StateMachine::new(bus))
    }

    fn id(s: &str) -> EntityId {
        s.parse().unwrap()
    }

    #[test]
    fn test_set_then_get() {
        let (_, sm) = machine();
        let attrs = HashMap::from([("volume_level".to_string(), json!(0.4))]);

        let written = sm.set(id("media_player.tv"), "on", attrs.clone(), Context::new());
        let read = sm.get("media_player.tv").unwrap();
        assert_eq!(read, written);
        assert_eq!(read.attributes, attrs);
        assert!(sm.get("not an id").is_none());
    }

    #[test]
    fn test_all_in_domains_is_sorted() {
        let (_, sm) = machine();
        for (eid, value) in [
            ("switch.b", "on"),
            ("switch.a", "off"),
            ("media_player.tv", "off"),
            ("light.hall", "on"),
            ("switch.a", "on"),
        ] {
            sm.set(id(eid), value, HashMap::new(), Context::new());
        }

        let ids: Vec<String> = sm
            .all_in_domains(&["switch", "media_player", "input_boolean"])
            .iter()
            .map(|s| s.entity_id.to_string())
            .collect();
        assert_eq!(ids, ["media_player.tv", "switch.a", "switch.b"]);
    }

    #[test]
    fn test_remove() {
        let (_, sm) = machine();
        sm.set(id("switch.amp"), "on", HashMap::new(), Context::new());

        assert_eq!(sm.remove(&id("switch.amp"), Context::new()).unwrap().state, "on");
        assert!(sm.get("switch.amp").is_none());
        assert!(sm.all_in_domains(&["switch"]).is_empty());
        assert!(sm.remove(&id("switch.amp"), Context::new()).is_none());
    }

    #[tokio::test]
    async fn test_every_write_fires_state_changed() {
        let (bus, sm) = machine();
        let mut rx = bus.subscribe_typed::<StateChangedData>();

        sm.set(id("switch.amp"), "on", HashMap::new(), Context::new());
        sm.set(id("switch.amp"), "off", HashMap::new(), Context::new());
        sm.remove(&id("switch.amp"), Context::new());

        let added = rx.recv().await.unwrap().data;
        assert!(added.old_state.is_none());

        let changed = rx.recv().await.unwrap().data;
        assert_eq!(changed.old_state.unwrap().state, "on");
        assert_eq!(changed.new_state.unwrap().state, "off");

        let removed = rx.recv().await.unwrap().data;
        assert!(removed.new_state.is_none());
    }
}
