//! Music Assistant integration
//!
//! Bridges a Music Assistant server into the hub:
//!
//! - server players appear as `media_player.mass_*` entities
//! - player and queue events are relayed through the dispatcher
//! - local switches, input booleans and media players are offered to the
//!   server as player controls and kept in sync both ways
//!
//! [`MusicAssistantIntegration`] is the [`IntegrationHandler`] for the
//! `music_assistant` domain; every loaded config entry owns one client, one
//! player control bridge and one media player platform.

pub mod config;
pub mod config_flow;
pub mod consts;
pub mod error;
pub mod media_player;
pub mod media_source;
pub mod player_controls;
pub mod relay;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use ha_config_entries::{ConfigEntries, ConfigEntry, IntegrationHandler};
use ha_hub::Hub;
use mass_client::{ClientFactory, MusicAssistantClient};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

pub use config::MassConfig;
pub use config_flow::{authenticate, MassConfigFlow, MassOptionsFlow, ZeroconfInfo};
pub use consts::DOMAIN;
pub use error::{MassError, MassResult};
pub use media_player::{MassPlayer, MediaPlayerPlatform};
pub use player_controls::{ControlFilter, HassPlayerControls, PlayerControl};
pub use relay::EventRelay;

/// What a loaded entry keeps alive
struct EntryRuntime {
    client: Arc<dyn MusicAssistantClient>,
    controls: Arc<HassPlayerControls>,
    platform: Arc<MediaPlayerPlatform>,
    // Held so the client's weak event callback stays live
    _relay: Arc<EventRelay>,
    tasks: Vec<JoinHandle<()>>,
}

impl EntryRuntime {
    fn shutdown(&self) {
        for task in &self.tasks {
            task.abort();
        }
        self.platform.shutdown();
    }
}

/// Lifecycle handler of the `music_assistant` domain
pub struct MusicAssistantIntegration {
    hub: Hub,
    factory: Arc<dyn ClientFactory>,
    runtimes: DashMap<String, EntryRuntime>,
}

impl MusicAssistantIntegration {
    pub fn new(hub: Hub, factory: Arc<dyn ClientFactory>) -> Arc<Self> {
        Arc::new(Self {
            hub,
            factory,
            runtimes: DashMap::new(),
        })
    }

    /// Register as the handler for `music_assistant` entries
    pub fn register(self: &Arc<Self>, entries: &ConfigEntries) {
        entries.register_handler(DOMAIN, self.clone());
    }

    pub fn client(&self, entry_id: &str) -> Option<Arc<dyn MusicAssistantClient>> {
        self.runtimes.get(entry_id).map(|r| r.client.clone())
    }

    pub fn player_controls(&self, entry_id: &str) -> Option<Arc<HassPlayerControls>> {
        self.runtimes.get(entry_id).map(|r| r.controls.clone())
    }

    pub fn media_players(&self, entry_id: &str) -> Option<Arc<MediaPlayerPlatform>> {
        self.runtimes.get(entry_id).map(|r| r.platform.clone())
    }

    pub fn is_loaded(&self, entry_id: &str) -> bool {
        self.runtimes.contains_key(entry_id)
    }
}

#[async_trait]
impl IntegrationHandler for MusicAssistantIntegration {
    #[instrument(skip(self, entry), fields(entry_id = %entry.entry_id))]
    async fn setup_entry(&self, entry: &ConfigEntry) -> Result<(), String> {
        let config = MassConfig::from_entry(entry).map_err(|e| e.to_string())?;
        let client = self.factory.create(&config.server);

        let controls = HassPlayerControls::new(self.hub.clone(), client.clone(), config.controls);
        let platform = MediaPlayerPlatform::new(self.hub.clone(), client.clone());
        let relay = EventRelay::new(self.hub.dispatcher.clone(), client.clone(), controls.clone());

        // Listeners first, so nothing the first connect produces is missed
        let mut tasks = vec![controls.listen(), platform.start()];
        relay.register();

        let connecting = client.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = connecting.connect(true).await {
                warn!(error = %e, "Music Assistant connection failed");
            }
        }));

        info!(host = %config.server.host, "Set up Music Assistant entry");
        if let Some(previous) = self.runtimes.insert(
            entry.entry_id.clone(),
            EntryRuntime {
                client,
                controls,
                platform,
                _relay: relay,
                tasks,
            },
        ) {
            debug!("Replacing runtime of an entry that was never unloaded");
            previous.shutdown();
        }
        Ok(())
    }

    #[instrument(skip(self, entry), fields(entry_id = %entry.entry_id))]
    async fn unload_entry(&self, entry: &ConfigEntry) -> Result<(), String> {
        let Some((_, runtime)) = self.runtimes.remove(&entry.entry_id) else {
            debug!("Entry has no runtime");
            return Ok(());
        };

        runtime.shutdown();
        runtime.client.close().await.map_err(|e| e.to_string())?;
        info!("Unloaded Music Assistant entry");
        Ok(())
    }
}
