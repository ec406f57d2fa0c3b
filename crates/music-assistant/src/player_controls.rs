//! Local entities as Music Assistant player controls
//!
//! Switches, input booleans and media players are offered to the server as
//! power controls (one per input source when the entity has a source list)
//! and, for media players, a volume control. The bridge keeps both sides in
//! step:
//!
//! - the server pushes a new control state through the callback registered
//!   with each control, which becomes a service call on the local entity
//! - local `state_changed` events for watched entities are turned into
//!   control updates sent back to the server
//!
//! Entities carrying the `mass_player_id` attribute are the server's own
//! players mirrored locally and are never offered back.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use dashmap::{DashMap, DashSet};
use ha_core::consts::media_player::{
    ATTR_INPUT_SOURCE, ATTR_INPUT_SOURCE_LIST, ATTR_MEDIA_VOLUME_LEVEL,
};
use ha_core::consts::{
    ATTR_ENTITY_ID, DOMAIN_INPUT_BOOLEAN, DOMAIN_MEDIA_PLAYER, DOMAIN_SWITCH,
    SERVICE_SELECT_SOURCE, SERVICE_TURN_OFF, SERVICE_TURN_ON, SERVICE_VOLUME_SET,
};
use ha_core::events::StateChangedData;
use ha_core::{Context, EntityId, State};
use ha_hub::{Hub, StateMachine};
use mass_client::{
    control_callback, BoxError, ControlCallback, ControlState, MusicAssistantClient,
    PlayerControlRegistration, PlayerControlType,
};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

use crate::consts::{is_off_state, ATTR_MASS_PLAYER_ID, PROVIDER_NAME};
use crate::error::{MassError, MassResult};

/// Domains whose entities can become player controls
pub const CONTROL_DOMAINS: [&str; 3] = [DOMAIN_SWITCH, DOMAIN_MEDIA_PLAYER, DOMAIN_INPUT_BOOLEAN];

/// Local volume level (0.0-1.0) on the server's 0-100 scale
pub fn to_remote_volume(level: f64) -> f64 {
    level * 100.0
}

/// Server volume (0-100) as a local volume level
pub fn to_local_volume(volume: f64) -> f64 {
    volume / 100.0
}

/// One control exposed to the server
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerControl {
    pub control_id: String,
    pub control_type: PlayerControlType,
    pub provider_name: String,
    pub name: String,
    /// Local entity the control mirrors
    pub entity_id: EntityId,
    /// Input source a power control selects; `None` for plain on/off
    pub source: Option<String>,
}

impl PlayerControl {
    fn power(entity: &State, source: Option<&str>) -> Self {
        let (control_id, name) = match source {
            Some(source) => (
                format!("{}_power_{}", entity.entity_id, source),
                format!("{}: {}", entity.name(), source),
            ),
            None => (format!("{}_power", entity.entity_id), entity.name()),
        };
        Self {
            control_id,
            control_type: PlayerControlType::Power,
            provider_name: PROVIDER_NAME.to_string(),
            name,
            entity_id: entity.entity_id.clone(),
            source: source.map(String::from),
        }
    }

    fn volume(entity: &State) -> Self {
        Self {
            control_id: format!("{}_volume", entity.entity_id),
            control_type: PlayerControlType::Volume,
            provider_name: PROVIDER_NAME.to_string(),
            name: entity.name(),
            entity_id: entity.entity_id.clone(),
            source: None,
        }
    }

    /// Control state derived from the entity's current state
    pub fn state_from(&self, entity: &State) -> ControlState {
        match (self.control_type, &self.source) {
            (PlayerControlType::Power, Some(source)) => ControlState::Power(
                entity.attribute::<String>(ATTR_INPUT_SOURCE).as_deref() == Some(source.as_str()),
            ),
            (PlayerControlType::Power, None) => ControlState::Power(!is_off_state(&entity.state)),
            (PlayerControlType::Volume, _) => ControlState::Volume(to_remote_volume(
                entity.attribute::<f64>(ATTR_MEDIA_VOLUME_LEVEL).unwrap_or(0.0),
            )),
        }
    }

    pub fn registration(&self, state: ControlState) -> PlayerControlRegistration {
        PlayerControlRegistration {
            control_type: self.control_type,
            control_id: self.control_id.clone(),
            provider_name: self.provider_name.clone(),
            name: self.name.clone(),
            state,
        }
    }

    /// Label shown when picking controls in the options flow
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.entity_id)
    }
}

/// The controls one entity can offer
pub fn entity_controls(entity: &State) -> Vec<PlayerControl> {
    if entity.has_attribute(ATTR_MASS_PLAYER_ID) {
        return Vec::new();
    }

    let sources: Vec<String> = entity
        .attribute(ATTR_INPUT_SOURCE_LIST)
        .unwrap_or_default();

    let mut controls = Vec::new();
    if sources.is_empty() {
        controls.push(PlayerControl::power(entity, None));
    }
    for source in &sources {
        // An empty source name stands for the plain on/off control
        let source = Some(source.as_str()).filter(|s| !s.is_empty());
        let control = PlayerControl::power(entity, source);
        if !controls.iter().any(|c| c.control_id == control.control_id) {
            controls.push(control);
        }
    }

    if entity.domain() == DOMAIN_MEDIA_PLAYER {
        controls.push(PlayerControl::volume(entity));
    }
    controls
}

/// Every control the current local entities can offer, ordered by entity id
pub fn control_candidates(states: &StateMachine) -> Vec<PlayerControl> {
    states
        .all_in_domains(&CONTROL_DOMAINS)
        .iter()
        .flat_map(entity_controls)
        .collect()
}

/// Which candidate controls get registered
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ControlFilter {
    #[default]
    All,
    /// Only these control ids
    Only(HashSet<String>),
}

impl ControlFilter {
    pub fn allows(&self, control: &PlayerControl) -> bool {
        match self {
            ControlFilter::All => true,
            ControlFilter::Only(ids) => ids.contains(&control.control_id),
        }
    }
}

/// Two-way sync between local entities and server player controls
///
/// One instance per config entry. `registered` only ever holds controls the
/// server accepted, and every entity referenced there is in `watched`.
pub struct HassPlayerControls {
    hub: Hub,
    client: Arc<dyn MusicAssistantClient>,
    filter: ControlFilter,
    registered: DashMap<String, PlayerControl>,
    watched: DashSet<String>,
}

impl HassPlayerControls {
    pub fn new(hub: Hub, client: Arc<dyn MusicAssistantClient>, filter: ControlFilter) -> Arc<Self> {
        Arc::new(Self {
            hub,
            client,
            filter,
            registered: DashMap::new(),
            watched: DashSet::new(),
        })
    }

    /// Start forwarding local state changes to the server
    ///
    /// The subscription is in place when this returns. The task ends when the
    /// bridge is dropped or the bus closes.
    pub fn listen(self: &Arc<Self>) -> JoinHandle<()> {
        let mut rx = self.hub.bus.subscribe_typed::<StateChangedData>();
        let bridge = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let Some(bridge) = bridge.upgrade() else {
                            break;
                        };
                        if let Err(e) = bridge.handle_state_event(&event.data).await {
                            warn!(
                                entity_id = %event.data.entity_id,
                                error = %e,
                                "Failed to push player control update"
                            );
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "State listener lagged, control states may be stale");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("State listener stopped");
        })
    }

    /// Register every enabled candidate control with the server
    ///
    /// Runs again after every reconnect. The registry is rebuilt from the
    /// current local states, so controls whose entity or source disappeared
    /// are dropped. Returns the number registered.
    #[instrument(skip(self))]
    pub async fn register_player_controls(self: &Arc<Self>) -> MassResult<usize> {
        let mut fresh: HashMap<String, PlayerControl> = HashMap::new();
        let result = self.register_candidates(&mut fresh).await;

        // Only what the server accepted this session stays addressable
        self.registered.clear();
        for (control_id, control) in fresh {
            self.registered.insert(control_id, control);
        }

        let count = result?;
        info!(count, "Registered player controls");
        Ok(count)
    }

    async fn register_candidates(
        self: &Arc<Self>,
        fresh: &mut HashMap<String, PlayerControl>,
    ) -> MassResult<usize> {
        for entity in self.hub.states.all_in_domains(&CONTROL_DOMAINS) {
            for control in entity_controls(&entity) {
                if !self.filter.allows(&control) {
                    trace!(control_id = %control.control_id, "Control not enabled");
                    continue;
                }

                let registration = control.registration(control.state_from(&entity));
                let callback = self.callback_for(&control.control_id);
                self.client
                    .register_player_control(registration, callback)
                    .await?;

                debug!(control_id = %control.control_id, "Registered player control");
                self.watched.insert(control.entity_id.to_string());
                fresh.insert(control.control_id.clone(), control);
            }
        }
        Ok(fresh.len())
    }

    fn callback_for(self: &Arc<Self>, control_id: &str) -> ControlCallback {
        let bridge: Weak<Self> = Arc::downgrade(self);
        let control_id = control_id.to_string();

        control_callback(move |state| {
            let bridge = bridge.clone();
            let control_id = control_id.clone();
            async move {
                let bridge = bridge
                    .upgrade()
                    .ok_or_else(|| BoxError::from("player controls were shut down"))?;
                bridge
                    .set_player_control_state(&control_id, state)
                    .await
                    .map_err(BoxError::from)
            }
        })
    }

    /// Apply a state the server pushed for one of our controls
    ///
    /// A sourced power control always selects its source, whatever the
    /// requested value. Service call failures are returned to the caller.
    #[instrument(skip(self))]
    pub async fn set_player_control_state(
        &self,
        control_id: &str,
        new_state: ControlState,
    ) -> MassResult<()> {
        let control = self
            .control(control_id)
            .ok_or_else(|| MassError::UnknownControl(control_id.to_string()))?;
        let entity_id = control.entity_id.to_string();
        let domain = control.entity_id.domain();

        let (service, data) = match (control.control_type, &control.source) {
            (PlayerControlType::Power, Some(source)) => (
                SERVICE_SELECT_SOURCE,
                json!({ ATTR_ENTITY_ID: entity_id, ATTR_INPUT_SOURCE: source }),
            ),
            (PlayerControlType::Power, None) => {
                let service = if new_state.is_on() {
                    SERVICE_TURN_ON
                } else {
                    SERVICE_TURN_OFF
                };
                (service, json!({ ATTR_ENTITY_ID: entity_id }))
            }
            (PlayerControlType::Volume, _) => (
                SERVICE_VOLUME_SET,
                json!({
                    ATTR_ENTITY_ID: entity_id,
                    ATTR_MEDIA_VOLUME_LEVEL: to_local_volume(new_state.level()),
                }),
            ),
        };

        debug!(domain, service, "Applying player control state");
        self.hub
            .services
            .call(domain, service, data, Context::new())
            .await?;
        Ok(())
    }

    /// Push the new state of a watched entity to each of its controls
    ///
    /// Every control of the entity is tried; the first failure is returned
    /// after the rest were sent. Removed entities and entities nobody
    /// watches send nothing.
    pub async fn handle_state_event(&self, data: &StateChangedData) -> MassResult<usize> {
        if !self.watched.contains(data.entity_id.to_string().as_str()) {
            return Ok(0);
        }
        let Some(new_state) = &data.new_state else {
            debug!(entity_id = %data.entity_id, "Watched entity removed");
            return Ok(0);
        };

        let mut controls: Vec<PlayerControl> = self
            .registered
            .iter()
            .filter(|c| c.entity_id == data.entity_id)
            .map(|c| c.value().clone())
            .collect();
        controls.sort_by(|a, b| a.control_id.cmp(&b.control_id));

        let mut first_error = None;
        for control in &controls {
            let state = control.state_from(new_state);
            trace!(control_id = %control.control_id, ?state, "Updating player control");
            if let Err(e) = self
                .client
                .update_player_control(&control.control_id, state)
                .await
            {
                warn!(control_id = %control.control_id, error = %e, "Player control update failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(controls.len()),
        }
    }

    pub fn control(&self, control_id: &str) -> Option<PlayerControl> {
        self.registered.get(control_id).map(|c| c.value().clone())
    }

    /// All registered controls, ordered by control id
    pub fn registered_controls(&self) -> Vec<PlayerControl> {
        let mut controls: Vec<PlayerControl> =
            self.registered.iter().map(|c| c.value().clone()).collect();
        controls.sort_by(|a, b| a.control_id.cmp(&b.control_id));
        controls
    }

    pub fn is_watched(&self, entity_id: &str) -> bool {
        self.watched.contains(entity_id)
    }
}
