//! Integration constants

use ha_core::consts::{STATE_OFF, STATE_UNAVAILABLE, STATE_UNKNOWN};

pub const DOMAIN: &str = "music_assistant";

pub const DEFAULT_NAME: &str = "Music Assistant";

/// Provider label attached to every player control we register
pub const PROVIDER_NAME: &str = "Home Assistant";

pub const CONF_POWER_CONTROL_ENTITIES: &str = "power_controls";
pub const CONF_VOLUME_CONTROL_ENTITIES: &str = "volume_controls";

/// Dispatcher signals between the event relay and the media player platform
pub const DISPATCH_KEY_PLAYERS: &str = "mass_media_player";
pub const DISPATCH_KEY_PLAYER_UPDATE: &str = "mass_media_player_update";
pub const DISPATCH_KEY_QUEUE_UPDATE: &str = "mass_queue_update";
pub const DISPATCH_KEY_QUEUE_TIME_UPDATE: &str = "mass_queue_time_update";
pub const DISPATCH_KEY_PLAYER_REMOVED: &str = "mass_media_player_removed";

/// Attribute marking an entity as one of our own media players
pub const ATTR_MASS_PLAYER_ID: &str = "mass_player_id";

/// States in which a local entity counts as powered off
pub const OFF_STATES: [&str; 3] = [STATE_OFF, STATE_UNAVAILABLE, STATE_UNKNOWN];

pub fn is_off_state(state: &str) -> bool {
    OFF_STATES.contains(&state)
}
