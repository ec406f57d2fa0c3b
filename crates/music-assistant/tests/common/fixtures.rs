//! Payload fixtures

use mass_client::{ArtistRef, MediaItem, PlaybackState, Player, PlayerQueue};
use serde_json::json;

use super::TestHub;

pub fn player(player_id: &str, name: &str) -> Player {
    Player {
        player_id: player_id.to_string(),
        name: name.to_string(),
        available: true,
        powered: true,
        state: PlaybackState::Idle,
        volume_level: 25.0,
        muted: false,
        active_queue: player_id.to_string(),
        device_info: None,
    }
}

pub fn track(item_id: &str, name: &str) -> MediaItem {
    MediaItem {
        item_id: item_id.to_string(),
        provider: "spotify".to_string(),
        media_type: "track".to_string(),
        name: name.to_string(),
        duration: Some(180.0),
        artists: vec![ArtistRef {
            name: "The Band".to_string(),
            item_id: None,
        }],
        album: None,
    }
}

pub fn playlist(item_id: &str, name: &str) -> MediaItem {
    MediaItem {
        item_id: item_id.to_string(),
        provider: "database".to_string(),
        media_type: "playlist".to_string(),
        name: name.to_string(),
        duration: None,
        artists: Vec::new(),
        album: None,
    }
}

pub fn queue(queue_id: &str, cur_item: Option<MediaItem>) -> PlayerQueue {
    PlayerQueue {
        queue_id: queue_id.to_string(),
        cur_item,
        cur_item_time: Some(0.0),
        shuffle_enabled: false,
    }
}

/// `media_player.tv`, off, with sources HDMI1 and HDMI2
pub fn add_tv(hub: &TestHub) {
    hub.set_state(
        "media_player.tv",
        "off",
        json!({
            "friendly_name": "TV",
            "source_list": ["HDMI1", "HDMI2"],
            "volume_level": 0.5
        }),
    );
}
