//! Test hub
//!
//! A hub whose switch, input_boolean and media_player services only record
//! the calls they receive.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ha_core::{Context, EntityId, ServiceCall, State};
use ha_hub::{Hub, ServiceError};

const RECORDED_SERVICES: [(&str, &str); 8] = [
    ("switch", "turn_on"),
    ("switch", "turn_off"),
    ("input_boolean", "turn_on"),
    ("input_boolean", "turn_off"),
    ("media_player", "turn_on"),
    ("media_player", "turn_off"),
    ("media_player", "select_source"),
    ("media_player", "volume_set"),
];

pub struct TestHub {
    pub hub: Hub,
    captured_service_calls: Arc<Mutex<Vec<ServiceCall>>>,
}

impl TestHub {
    pub fn new() -> Self {
        let hub = Hub::new();
        let captured_service_calls = Arc::new(Mutex::new(Vec::new()));

        for (domain, service) in RECORDED_SERVICES {
            let calls = captured_service_calls.clone();
            hub.services.register(domain, service, move |call: ServiceCall| {
                let calls = calls.clone();
                async move {
                    calls.lock().unwrap().push(call);
                    Ok(None)
                }
            });
        }

        Self {
            hub,
            captured_service_calls,
        }
    }

    /// Replace a service with one that always fails
    pub fn fail_service(&self, domain: &str, service: &str) {
        self.hub.services.register(domain, service, |_call: ServiceCall| async {
            Err(ServiceError::CallFailed("device offline".to_string()))
        });
    }

    pub fn set_state(&self, entity_id: &str, state: &str, attributes: serde_json::Value) -> State {
        let entity_id: EntityId = entity_id.parse().expect("Invalid entity_id");
        let attributes = serde_json::from_value(attributes).expect("attributes must be an object");
        self.hub
            .states
            .set(entity_id, state, attributes, Context::new())
    }

    pub fn remove_state(&self, entity_id: &str) {
        let entity_id: EntityId = entity_id.parse().expect("Invalid entity_id");
        self.hub.states.remove(&entity_id, Context::new());
    }

    pub fn get_state(&self, entity_id: &str) -> Option<State> {
        self.hub.states.get(entity_id)
    }

    pub fn captured_service_calls(&self) -> Vec<ServiceCall> {
        self.captured_service_calls.lock().unwrap().clone()
    }

    pub fn clear_service_calls(&self) {
        self.captured_service_calls.lock().unwrap().clear();
    }
}

impl Default for TestHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll `condition` until it holds, panicking after two seconds
pub async fn wait_for(description: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", description);
}

/// Give spawned listeners a chance to drain their channels
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
