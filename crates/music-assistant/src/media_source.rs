//! Media identifiers
//!
//! Media items are addressed as `media-source://music_assistant/{mass_id}/{media_type}/{content_id}`
//! where `content_id` mangles provider and item id as `{provider}###{item_id}`.

use ha_core::consts::media_player::{
    MEDIA_TYPE_ALBUM, MEDIA_TYPE_ARTIST, MEDIA_TYPE_PLAYLIST, MEDIA_TYPE_TRACK,
};
use mass_client::MediaRef;

use crate::error::{MassError, MassResult};

pub const MASS_URI_SCHEME: &str = "media-source://music_assistant/";

pub const ITEM_ID_SEPARATOR: &str = "###";

pub const MEDIA_TYPE_RADIO: &str = "radio";

/// Media types the server can enqueue directly
pub const PLAYABLE_MEDIA_TYPES: [&str; 5] = [
    MEDIA_TYPE_PLAYLIST,
    MEDIA_TYPE_ALBUM,
    MEDIA_TYPE_ARTIST,
    MEDIA_TYPE_RADIO,
    MEDIA_TYPE_TRACK,
];

pub fn is_playable(media_type: &str) -> bool {
    PLAYABLE_MEDIA_TYPES.contains(&media_type)
}

/// `{provider}###{item_id}`
pub fn content_id(provider: &str, item_id: &str) -> String {
    format!("{}{}{}", provider, ITEM_ID_SEPARATOR, item_id)
}

/// Split a content id into provider and item id
pub fn split_content_id(content_id: &str) -> Option<(&str, &str)> {
    content_id.split_once(ITEM_ID_SEPARATOR)
}

/// A parsed media source URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUri {
    pub mass_id: String,
    pub media_type: String,
    /// Empty for a listing of a whole media type
    pub content_id: String,
    pub provider: String,
    pub item_id: String,
}

impl MediaUri {
    pub fn media_ref(&self) -> MediaRef {
        MediaRef {
            media_type: self.media_type.clone(),
            provider: self.provider.clone(),
            item_id: self.item_id.clone(),
        }
    }
}

/// Parse a media source URI; the scheme prefix is optional
pub fn parse_uri(uri: &str) -> MassResult<MediaUri> {
    let path = uri.strip_prefix(MASS_URI_SCHEME).unwrap_or(uri);
    let path = path.strip_prefix('/').unwrap_or(path);

    let mut parts = path.splitn(3, '/');
    let mass_id = parts.next().unwrap_or_default();
    let media_type = parts
        .next()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| MassError::InvalidMedia(uri.to_string()))?;
    let content_id = parts.next().unwrap_or_default();

    let (provider, item_id) = if content_id.is_empty() {
        ("", "")
    } else {
        split_content_id(content_id).ok_or_else(|| MassError::InvalidMedia(uri.to_string()))?
    };

    Ok(MediaUri {
        mass_id: mass_id.to_string(),
        media_type: media_type.to_string(),
        content_id: content_id.to_string(),
        provider: provider.to_string(),
        item_id: item_id.to_string(),
    })
}
