//! Server events onto the local dispatcher
//!
//! Player and queue events are republished under the integration's signal
//! keys. On every (re)connect the full player list is replayed and the
//! player controls are registered again, since the server forgets both when
//! the connection drops.

use std::sync::Arc;

use ha_hub::Dispatcher;
use mass_client::{event_callback, EventCallback, EventKind, MassEvent, MusicAssistantClient};
use tracing::{debug, info, warn};

use crate::consts::{
    DISPATCH_KEY_PLAYERS, DISPATCH_KEY_PLAYER_REMOVED, DISPATCH_KEY_QUEUE_TIME_UPDATE,
    DISPATCH_KEY_QUEUE_UPDATE,
};
use crate::error::MassResult;
use crate::player_controls::HassPlayerControls;

/// Event kinds the relay subscribes to
pub const SUBSCRIBE_EVENTS: [EventKind; 6] = [
    EventKind::Connected,
    EventKind::PlayerAdded,
    EventKind::PlayerChanged,
    EventKind::PlayerRemoved,
    EventKind::QueueUpdated,
    EventKind::QueueTimeUpdated,
];

pub struct EventRelay {
    dispatcher: Arc<Dispatcher>,
    client: Arc<dyn MusicAssistantClient>,
    controls: Arc<HassPlayerControls>,
}

impl EventRelay {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        client: Arc<dyn MusicAssistantClient>,
        controls: Arc<HassPlayerControls>,
    ) -> Arc<Self> {
        Arc::new(Self {
            dispatcher,
            client,
            controls,
        })
    }

    /// Subscribe the relay to the client's events
    pub fn register(self: &Arc<Self>) {
        self.client
            .register_event_callback(self.callback(), &SUBSCRIBE_EVENTS);
    }

    // The client owns the callback, so it only holds the relay weakly
    fn callback(self: &Arc<Self>) -> EventCallback {
        let relay = Arc::downgrade(self);
        event_callback(move |event| {
            let relay = relay.upgrade();
            async move {
                let Some(relay) = relay else {
                    return;
                };
                let kind = event.kind();
                if let Err(e) = relay.handle_event(event).await {
                    warn!(event = %kind, error = %e, "Failed to handle Music Assistant event");
                }
            }
        })
    }

    pub async fn handle_event(&self, event: MassEvent) -> MassResult<()> {
        match event {
            MassEvent::PlayerAdded(player) | MassEvent::PlayerChanged(player) => {
                self.dispatcher.send(DISPATCH_KEY_PLAYERS, &player);
            }
            MassEvent::PlayerRemoved { player_id } => {
                self.dispatcher.send(DISPATCH_KEY_PLAYER_REMOVED, &player_id);
            }
            MassEvent::QueueUpdated(queue) => {
                self.dispatcher.send(DISPATCH_KEY_QUEUE_UPDATE, &queue);
            }
            MassEvent::QueueTimeUpdated(update) => {
                self.dispatcher.send(DISPATCH_KEY_QUEUE_TIME_UPDATE, &update);
            }
            MassEvent::Connected => {
                info!(host = %self.client.host(), "Music Assistant is connected");
                let players = self.client.get_players().await?;
                debug!(count = players.len(), "Replaying players");
                for player in &players {
                    self.dispatcher.send(DISPATCH_KEY_PLAYERS, player);
                }
                self.controls.register_player_controls().await?;
            }
        }
        Ok(())
    }
}
