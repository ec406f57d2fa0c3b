//! Well-known domains, attribute keys, service names and state values

/// Domain of switch entities
pub const DOMAIN_SWITCH: &str = "switch";

/// Domain of media player entities
pub const DOMAIN_MEDIA_PLAYER: &str = "media_player";

/// Domain of input_boolean helpers
pub const DOMAIN_INPUT_BOOLEAN: &str = "input_boolean";

pub const ATTR_ENTITY_ID: &str = "entity_id";
pub const ATTR_FRIENDLY_NAME: &str = "friendly_name";
pub const ATTR_ENTITY_PICTURE: &str = "entity_picture";
pub const ATTR_SUPPORTED_FEATURES: &str = "supported_features";

pub const SERVICE_TURN_ON: &str = "turn_on";
pub const SERVICE_TURN_OFF: &str = "turn_off";
pub const SERVICE_VOLUME_SET: &str = "volume_set";
pub const SERVICE_SELECT_SOURCE: &str = "select_source";

pub const STATE_OFF: &str = "off";
pub const STATE_UNAVAILABLE: &str = "unavailable";
pub const STATE_UNKNOWN: &str = "unknown";
pub const STATE_PLAYING: &str = "playing";
pub const STATE_PAUSED: &str = "paused";
pub const STATE_IDLE: &str = "idle";

/// Attribute keys and feature flags of the media_player domain
pub mod media_player {
    pub const ATTR_INPUT_SOURCE: &str = "source";
    pub const ATTR_INPUT_SOURCE_LIST: &str = "source_list";
    pub const ATTR_MEDIA_VOLUME_LEVEL: &str = "volume_level";
    pub const ATTR_MEDIA_VOLUME_MUTED: &str = "is_volume_muted";
    pub const ATTR_MEDIA_CONTENT_ID: &str = "media_content_id";
    pub const ATTR_MEDIA_CONTENT_TYPE: &str = "media_content_type";
    pub const ATTR_MEDIA_TITLE: &str = "media_title";
    pub const ATTR_MEDIA_ARTIST: &str = "media_artist";
    pub const ATTR_MEDIA_ALBUM_NAME: &str = "media_album_name";
    pub const ATTR_MEDIA_ALBUM_ARTIST: &str = "media_album_artist";
    pub const ATTR_MEDIA_DURATION: &str = "media_duration";
    pub const ATTR_MEDIA_POSITION: &str = "media_position";
    pub const ATTR_MEDIA_POSITION_UPDATED_AT: &str = "media_position_updated_at";
    pub const ATTR_MEDIA_SHUFFLE: &str = "shuffle";

    pub const MEDIA_TYPE_PLAYLIST: &str = "playlist";
    pub const MEDIA_TYPE_ALBUM: &str = "album";
    pub const MEDIA_TYPE_ARTIST: &str = "artist";
    pub const MEDIA_TYPE_TRACK: &str = "track";

    pub const SUPPORT_PAUSE: u32 = 1;
    pub const SUPPORT_VOLUME_SET: u32 = 4;
    pub const SUPPORT_VOLUME_MUTE: u32 = 8;
    pub const SUPPORT_PREVIOUS_TRACK: u32 = 16;
    pub const SUPPORT_NEXT_TRACK: u32 = 32;
    pub const SUPPORT_TURN_ON: u32 = 128;
    pub const SUPPORT_TURN_OFF: u32 = 256;
    pub const SUPPORT_PLAY_MEDIA: u32 = 512;
    pub const SUPPORT_VOLUME_STEP: u32 = 1024;
    pub const SUPPORT_STOP: u32 = 4096;
    pub const SUPPORT_CLEAR_PLAYLIST: u32 = 8192;
    pub const SUPPORT_PLAY: u32 = 16384;
    pub const SUPPORT_SHUFFLE_SET: u32 = 32768;
}
