//! `domain.object_id` addresses

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("'{0}' is not of the form domain.object_id")]
    Malformed(String),

    #[error("invalid domain '{0}'")]
    BadDomain(String),

    #[error("invalid object id '{0}'")]
    BadObjectId(String),
}

/// Address of an entity, e.g. `media_player.living_room`
///
/// Both halves are non-empty runs of `[a-z0-9_]` that neither start nor end
/// with an underscore; a domain may not contain `__` either.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    domain: String,
    object_id: String,
}

impl EntityId {
    pub fn new(
        domain: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Result<Self, EntityIdError> {
        let domain = domain.into();
        let object_id = object_id.into();

        if !valid_part(&domain) || domain.contains("__") {
            return Err(EntityIdError::BadDomain(domain));
        }
        if !valid_part(&object_id) {
            return Err(EntityIdError::BadObjectId(object_id));
        }
        Ok(Self { domain, object_id })
    }

    /// Entity id in `domain` whose object id is `raw` run through [`slugify`]
    pub fn from_slug(domain: &str, raw: &str) -> Result<Self, EntityIdError> {
        Self::new(domain, slugify(raw))
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }
}

fn valid_part(part: &str) -> bool {
    let allowed = |c: char| matches!(c, 'a'..='z' | '0'..='9' | '_');
    !part.is_empty()
        && part.chars().all(allowed)
        && !part.starts_with('_')
        && !part.ends_with('_')
}

/// Lowercase `raw`, collapsing each run of other characters into one `_`
pub fn slugify(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (domain, object_id) = s
            .split_once('.')
            .filter(|(_, rest)| !rest.contains('.'))
            .ok_or_else(|| EntityIdError::Malformed(s.to_string()))?;
        Self::new(domain, object_id)
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> String {
        id.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.object_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_display() {
        let id: EntityId = "media_player.living_room".parse().unwrap();
        assert_eq!((id.domain(), id.object_id()), ("media_player", "living_room"));
        assert_eq!(id.to_string(), "media_player.living_room");
    }

    #[test]
    fn test_rejects_bad_ids() {
        assert!(matches!(
            "no_separator".parse::<EntityId>(),
            Err(EntityIdError::Malformed(_))
        ));
        assert!(matches!(
            "too.many.parts".parse::<EntityId>(),
            Err(EntityIdError::Malformed(_))
        ));
        assert_eq!(
            ".object".parse::<EntityId>().unwrap_err(),
            EntityIdError::BadDomain(String::new())
        );
        assert_eq!(
            "switch.Kitchen".parse::<EntityId>().unwrap_err(),
            EntityIdError::BadObjectId("Kitchen".into())
        );
        assert!(matches!(
            "my__switch.room".parse::<EntityId>(),
            Err(EntityIdError::BadDomain(_))
        ));
        assert!("switch.my__room".parse::<EntityId>().is_ok());
    }

    #[test]
    fn test_slugged_ids() {
        let id = EntityId::from_slug("media_player", "mass_Sonos:Kitchen 01").unwrap();
        assert_eq!(id.to_string(), "media_player.mass_sonos_kitchen_01");
        assert_eq!(slugify("--Living  Room--"), "living_room");
        assert!(EntityId::from_slug("media_player", "???").is_err());
    }

    #[test]
    fn test_serialized_as_plain_string() {
        let id = EntityId::new("input_boolean", "party_mode").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"input_boolean.party_mode\"");
        assert_eq!(serde_json::from_str::<EntityId>(&json).unwrap(), id);
    }
}
