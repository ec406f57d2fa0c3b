//! Events pushed by the server

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::EventCallback;
use crate::models::{Player, PlayerQueue, QueueTimeUpdate};

/// Event names a callback can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "connected")]
    Connected,
    #[serde(rename = "player added")]
    PlayerAdded,
    #[serde(rename = "player changed")]
    PlayerChanged,
    #[serde(rename = "player removed")]
    PlayerRemoved,
    #[serde(rename = "queue updated")]
    QueueUpdated,
    #[serde(rename = "queue time updated")]
    QueueTimeUpdated,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connected => "connected",
            EventKind::PlayerAdded => "player added",
            EventKind::PlayerChanged => "player changed",
            EventKind::PlayerRemoved => "player removed",
            EventKind::QueueUpdated => "queue updated",
            EventKind::QueueTimeUpdated => "queue time updated",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event with its details
#[derive(Debug, Clone, PartialEq)]
pub enum MassEvent {
    /// The connection was (re-)established
    Connected,
    PlayerAdded(Player),
    PlayerChanged(Player),
    PlayerRemoved { player_id: String },
    QueueUpdated(PlayerQueue),
    QueueTimeUpdated(QueueTimeUpdate),
}

impl MassEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MassEvent::Connected => EventKind::Connected,
            MassEvent::PlayerAdded(_) => EventKind::PlayerAdded,
            MassEvent::PlayerChanged(_) => EventKind::PlayerChanged,
            MassEvent::PlayerRemoved { .. } => EventKind::PlayerRemoved,
            MassEvent::QueueUpdated(_) => EventKind::QueueUpdated,
            MassEvent::QueueTimeUpdated(_) => EventKind::QueueTimeUpdated,
        }
    }
}

/// Wrap an async closure as an [`EventCallback`]
pub fn event_callback<F, Fut>(f: F) -> EventCallback
where
    F: Fn(MassEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |event| Box::pin(f(event)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_kind_names() {
        assert_eq!(
            serde_json::to_value(EventKind::QueueTimeUpdated).unwrap(),
            json!("queue time updated")
        );
        assert_eq!(EventKind::PlayerAdded.to_string(), "player added");
    }

    #[test]
    fn test_event_kind_of_event() {
        let removed = MassEvent::PlayerRemoved {
            player_id: "kitchen".into(),
        };
        assert_eq!(removed.kind(), EventKind::PlayerRemoved);
        assert_eq!(MassEvent::Connected.kind(), EventKind::Connected);
    }
}
