//! Payload models exchanged with the server

use serde::{Deserialize, Serialize};

/// Playback state reported by a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
    Off,
    #[default]
    #[serde(other)]
    Idle,
}

/// Manufacturer details of a player's device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// A player known to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub powered: bool,
    #[serde(default)]
    pub state: PlaybackState,
    /// Volume on the server's 0-100 scale
    #[serde(default)]
    pub volume_level: f64,
    #[serde(default)]
    pub muted: bool,
    /// Queue currently feeding this player, possibly a group parent's
    #[serde(default)]
    pub active_queue: String,
    #[serde(default)]
    pub device_info: Option<DeviceInfo>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub name: String,
    #[serde(default)]
    pub item_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub name: String,
    #[serde(default)]
    pub artist: Option<ArtistRef>,
}

/// A track, radio station, album, artist or playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub item_id: String,
    pub provider: String,
    pub media_type: String,
    pub name: String,
    /// Length in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
}

impl MediaItem {
    /// Reference to this item for `play_media`
    pub fn media_ref(&self) -> MediaRef {
        MediaRef {
            media_type: self.media_type.clone(),
            provider: self.provider.clone(),
            item_id: self.item_id.clone(),
        }
    }
}

/// The minimal identity of a media item the server needs to play it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub media_type: String,
    pub provider: String,
    pub item_id: String,
}

/// Queue state of a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerQueue {
    pub queue_id: String,
    #[serde(default)]
    pub cur_item: Option<MediaItem>,
    /// Elapsed seconds of the current item
    #[serde(default)]
    pub cur_item_time: Option<f64>,
    #[serde(default)]
    pub shuffle_enabled: bool,
}

/// Periodic progress report for a queue's current item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueTimeUpdate {
    pub queue_id: String,
    pub cur_item_time: f64,
}

/// How new media is placed in a player's queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueOption {
    /// Insert and start playing immediately
    #[default]
    Play,
    /// Play after the current item
    Next,
    /// Append to the end of the queue
    Add,
    /// Clear the queue first
    Replace,
}

impl QueueOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueOption::Play => "play",
            QueueOption::Next => "next",
            QueueOption::Add => "add",
            QueueOption::Replace => "replace",
        }
    }
}

/// Command sent to a single player
///
/// Serialized as `{"command": "volume_set", "args": 30}`; commands without
/// an argument omit `args`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum PlayerCommand {
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    /// Absolute volume, 0-100
    VolumeSet(u8),
    VolumeMute(bool),
    VolumeUp,
    VolumeDown,
    PowerOn,
    PowerOff,
}

impl PlayerCommand {
    /// Command name on the wire
    pub fn name(&self) -> &'static str {
        match self {
            PlayerCommand::Play => "play",
            PlayerCommand::Pause => "pause",
            PlayerCommand::Stop => "stop",
            PlayerCommand::Next => "next",
            PlayerCommand::Previous => "previous",
            PlayerCommand::VolumeSet(_) => "volume_set",
            PlayerCommand::VolumeMute(_) => "volume_mute",
            PlayerCommand::VolumeUp => "volume_up",
            PlayerCommand::VolumeDown => "volume_down",
            PlayerCommand::PowerOn => "power_on",
            PlayerCommand::PowerOff => "power_off",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_player_defaults() {
        let player: Player = serde_json::from_value(json!({
            "player_id": "kitchen",
            "name": "Kitchen",
            "state": "buffering"
        }))
        .unwrap();

        assert!(player.available);
        assert!(!player.powered);
        assert_eq!(player.state, PlaybackState::Idle);
        assert_eq!(player.volume_level, 0.0);
        assert!(player.device_info.is_none());
    }

    #[test]
    fn test_queue_with_current_item() {
        let queue: PlayerQueue = serde_json::from_value(json!({
            "queue_id": "kitchen",
            "cur_item": {
                "item_id": "42",
                "provider": "spotify",
                "media_type": "track",
                "name": "Song",
                "duration": 215,
                "artists": [{"name": "A"}, {"name": "B"}],
                "album": {"name": "Record", "artist": {"name": "A"}}
            },
            "cur_item_time": 12.5,
            "shuffle_enabled": true
        }))
        .unwrap();

        let item = queue.cur_item.unwrap();
        assert_eq!(item.duration, Some(215.0));
        assert_eq!(item.artists.len(), 2);
        assert_eq!(
            item.media_ref(),
            MediaRef {
                media_type: "track".into(),
                provider: "spotify".into(),
                item_id: "42".into(),
            }
        );
        assert!(queue.shuffle_enabled);
    }

    #[test]
    fn test_player_command_wire_format() {
        assert_eq!(
            serde_json::to_value(PlayerCommand::VolumeSet(30)).unwrap(),
            json!({"command": "volume_set", "args": 30})
        );
        assert_eq!(
            serde_json::to_value(PlayerCommand::Next).unwrap(),
            json!({"command": "next"})
        );
        assert_eq!(PlayerCommand::VolumeMute(true).name(), "volume_mute");
    }

    #[test]
    fn test_queue_option_names() {
        assert_eq!(serde_json::to_value(QueueOption::Add).unwrap(), json!("add"));
        assert_eq!(QueueOption::default().as_str(), "play");
    }
}
