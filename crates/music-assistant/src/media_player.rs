//! Media player platform
//!
//! Every available server player becomes a `media_player.mass_{player_id}`
//! entity. The platform listens for player add/change/remove signals from
//! the event relay; each player listens for its own updates and for queue
//! progress and writes its state to the state machine after every change.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ha_core::consts::media_player::*;
use ha_core::consts::{
    ATTR_ENTITY_PICTURE, ATTR_FRIENDLY_NAME, ATTR_SUPPORTED_FEATURES, DOMAIN_MEDIA_PLAYER,
    STATE_IDLE, STATE_OFF, STATE_PAUSED, STATE_PLAYING, STATE_UNAVAILABLE,
};
use ha_core::{Context, EntityId};
use ha_hub::{Dispatcher, Hub, StateMachine};
use mass_client::{
    MediaItem, MediaRef, MusicAssistantClient, PlaybackState, Player, PlayerCommand, PlayerQueue,
    QueueOption, QueueTimeUpdate,
};
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::consts::{
    ATTR_MASS_PLAYER_ID, DISPATCH_KEY_PLAYERS, DISPATCH_KEY_PLAYER_REMOVED,
    DISPATCH_KEY_PLAYER_UPDATE, DISPATCH_KEY_QUEUE_TIME_UPDATE, DISPATCH_KEY_QUEUE_UPDATE,
};
use crate::error::MassResult;
use crate::media_source::{
    content_id, is_playable, parse_uri, split_content_id, MASS_URI_SCHEME,
};

pub const SUPPORTED_FEATURES: u32 = SUPPORT_PAUSE
    | SUPPORT_VOLUME_SET
    | SUPPORT_STOP
    | SUPPORT_PREVIOUS_TRACK
    | SUPPORT_NEXT_TRACK
    | SUPPORT_SHUFFLE_SET
    | SUPPORT_TURN_ON
    | SUPPORT_TURN_OFF
    | SUPPORT_VOLUME_MUTE
    | SUPPORT_PLAY
    | SUPPORT_PLAY_MEDIA
    | SUPPORT_VOLUME_STEP
    | SUPPORT_CLEAR_PLAYLIST;

/// Signal carrying updates for one known player
pub fn player_update_signal(player_id: &str) -> String {
    format!("{}_{}", DISPATCH_KEY_PLAYER_UPDATE, player_id)
}

/// Entity id of the media player mirroring `player_id`
pub fn player_entity_id(player_id: &str) -> MassResult<EntityId> {
    Ok(EntityId::from_slug(
        DOMAIN_MEDIA_PLAYER,
        &format!("mass_{}", player_id),
    )?)
}

#[derive(Debug, Clone)]
struct PlayerData {
    player: Player,
    queue: Option<PlayerQueue>,
    cur_image: Option<String>,
    /// When the queue position was last reported
    updated_at: Option<DateTime<Utc>>,
}

impl PlayerData {
    fn state(&self) -> &'static str {
        if !self.player.available {
            return STATE_UNAVAILABLE;
        }
        if !self.player.powered {
            return STATE_OFF;
        }
        match self.player.state {
            PlaybackState::Playing => STATE_PLAYING,
            PlaybackState::Paused => STATE_PAUSED,
            _ => STATE_IDLE,
        }
    }

    fn cur_item(&self) -> Option<&MediaItem> {
        self.queue.as_ref().and_then(|q| q.cur_item.as_ref())
    }

    fn attributes(&self) -> HashMap<String, Value> {
        let mut attrs = HashMap::from([
            (ATTR_FRIENDLY_NAME.to_string(), json!(self.player.name)),
            (ATTR_MASS_PLAYER_ID.to_string(), json!(self.player.player_id)),
            (ATTR_SUPPORTED_FEATURES.to_string(), json!(SUPPORTED_FEATURES)),
        ]);
        if !self.player.available {
            return attrs;
        }

        attrs.insert(
            ATTR_MEDIA_VOLUME_LEVEL.to_string(),
            json!(self.player.volume_level / 100.0),
        );
        attrs.insert(ATTR_MEDIA_VOLUME_MUTED.to_string(), json!(self.player.muted));

        if let Some(queue) = &self.queue {
            attrs.insert(ATTR_MEDIA_SHUFFLE.to_string(), json!(queue.shuffle_enabled));
            if let Some(position) = queue.cur_item_time {
                attrs.insert(ATTR_MEDIA_POSITION.to_string(), json!(position));
            }
        }
        if let Some(updated_at) = self.updated_at {
            attrs.insert(
                ATTR_MEDIA_POSITION_UPDATED_AT.to_string(),
                json!(updated_at.to_rfc3339()),
            );
        }

        if let Some(item) = self.cur_item() {
            attrs.insert(
                ATTR_MEDIA_CONTENT_ID.to_string(),
                json!(content_id(&item.provider, &item.item_id)),
            );
            attrs.insert(ATTR_MEDIA_CONTENT_TYPE.to_string(), json!(item.media_type));
            attrs.insert(ATTR_MEDIA_TITLE.to_string(), json!(item.name));
            if let Some(duration) = item.duration {
                attrs.insert(ATTR_MEDIA_DURATION.to_string(), json!(duration));
            }
            if !item.artists.is_empty() {
                let artists: Vec<&str> = item.artists.iter().map(|a| a.name.as_str()).collect();
                attrs.insert(ATTR_MEDIA_ARTIST.to_string(), json!(artists.join("/")));
            }
            if let Some(album) = &item.album {
                attrs.insert(ATTR_MEDIA_ALBUM_NAME.to_string(), json!(album.name));
                if let Some(artist) = &album.artist {
                    attrs.insert(ATTR_MEDIA_ALBUM_ARTIST.to_string(), json!(artist.name));
                }
            }
        }
        if let Some(image) = &self.cur_image {
            attrs.insert(ATTR_ENTITY_PICTURE.to_string(), json!(image));
        }
        attrs
    }
}

enum PlayerMessage {
    Player(Player),
    Queue(PlayerQueue),
    QueueTime(QueueTimeUpdate),
}

/// One server player as a local media player entity
pub struct MassPlayer {
    client: Arc<dyn MusicAssistantClient>,
    states: Arc<StateMachine>,
    player_id: String,
    entity_id: EntityId,
    data: Mutex<PlayerData>,
}

impl MassPlayer {
    pub fn new(
        client: Arc<dyn MusicAssistantClient>,
        states: Arc<StateMachine>,
        player: Player,
    ) -> MassResult<Arc<Self>> {
        Ok(Arc::new(Self {
            client,
            states,
            player_id: player.player_id.clone(),
            entity_id: player_entity_id(&player.player_id)?,
            data: Mutex::new(PlayerData {
                player,
                queue: None,
                cur_image: None,
                updated_at: None,
            }),
        }))
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// Snapshot of the player as last reported
    pub async fn player(&self) -> Player {
        self.data.lock().await.player.clone()
    }

    /// Start listening for this player's updates, fetch its queue once and
    /// write the first state
    pub async fn added(self: &Arc<Self>, dispatcher: &Dispatcher) -> JoinHandle<()> {
        let task = self.listen(dispatcher);

        match self.client.get_player_queue(&self.player_id).await {
            Ok(queue) => self.data.lock().await.queue = Some(queue),
            Err(e) => warn!(player_id = %self.player_id, error = %e, "Failed to fetch player queue"),
        }
        self.write_state().await;
        task
    }

    fn listen(self: &Arc<Self>, dispatcher: &Dispatcher) -> JoinHandle<()> {
        let mut updates = dispatcher.connect(&player_update_signal(&self.player_id));
        let mut queues = dispatcher.connect(DISPATCH_KEY_QUEUE_UPDATE);
        let mut queue_times = dispatcher.connect(DISPATCH_KEY_QUEUE_TIME_UPDATE);
        let player: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                let message = tokio::select! {
                    r = updates.recv_typed::<Player>() => r.map(PlayerMessage::Player),
                    r = queues.recv_typed::<PlayerQueue>() => r.map(PlayerMessage::Queue),
                    r = queue_times.recv_typed::<QueueTimeUpdate>() => r.map(PlayerMessage::QueueTime),
                };
                let Some(player) = player.upgrade() else {
                    break;
                };
                match message {
                    Ok(PlayerMessage::Player(data)) => player.update_player(data).await,
                    Ok(PlayerMessage::Queue(queue)) => player.update_queue(queue).await,
                    Ok(PlayerMessage::QueueTime(update)) => player.update_queue_time(update).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(player_id = %player.player_id, skipped, "Player listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    async fn write_state(&self) {
        let (state, attributes) = {
            let data = self.data.lock().await;
            (data.state(), data.attributes())
        };
        self.states
            .set(self.entity_id.clone(), state, attributes, Context::new());
    }

    pub async fn update_player(&self, player: Player) {
        self.data.lock().await.player = player;
        self.write_state().await;
    }

    /// The player is gone from the server but may come back
    pub async fn mark_unavailable(&self) {
        self.data.lock().await.player.available = false;
        self.write_state().await;
    }

    /// Apply a queue update if the queue currently feeds this player
    pub async fn update_queue(&self, queue: PlayerQueue) {
        let active_queue = self.data.lock().await.player.active_queue.clone();
        if queue.queue_id != active_queue {
            return;
        }

        let cur_image = match &queue.cur_item {
            Some(item) => match self.client.media_item_image_url(item).await {
                Ok(url) => url,
                Err(e) => {
                    debug!(player_id = %self.player_id, error = %e, "No image for current item");
                    None
                }
            },
            None => None,
        };

        {
            let mut data = self.data.lock().await;
            data.queue = Some(queue);
            data.cur_image = cur_image;
            data.updated_at = Some(Utc::now());
        }
        self.write_state().await;
    }

    pub async fn update_queue_time(&self, update: QueueTimeUpdate) {
        {
            let mut data = self.data.lock().await;
            if update.queue_id != data.player.active_queue {
                return;
            }
            if let Some(queue) = data.queue.as_mut() {
                queue.cur_item_time = Some(update.cur_item_time);
            }
            data.updated_at = Some(Utc::now());
        }
        self.write_state().await;
    }

    async fn command(&self, command: PlayerCommand) -> MassResult<()> {
        debug!(player_id = %self.player_id, command = command.name(), "Sending player command");
        Ok(self.client.player_command(&self.player_id, command).await?)
    }

    pub async fn media_play(&self) -> MassResult<()> {
        self.command(PlayerCommand::Play).await
    }

    pub async fn media_pause(&self) -> MassResult<()> {
        self.command(PlayerCommand::Pause).await
    }

    pub async fn media_stop(&self) -> MassResult<()> {
        self.command(PlayerCommand::Stop).await
    }

    pub async fn media_next_track(&self) -> MassResult<()> {
        self.command(PlayerCommand::Next).await
    }

    pub async fn media_previous_track(&self) -> MassResult<()> {
        self.command(PlayerCommand::Previous).await
    }

    /// Set volume from a 0.0-1.0 level; the server takes whole percents
    pub async fn set_volume_level(&self, level: f64) -> MassResult<()> {
        let volume = (level.clamp(0.0, 1.0) * 100.0) as u8;
        self.command(PlayerCommand::VolumeSet(volume)).await
    }

    pub async fn mute_volume(&self, mute: bool) -> MassResult<()> {
        self.command(PlayerCommand::VolumeMute(mute)).await
    }

    pub async fn volume_up(&self) -> MassResult<()> {
        self.command(PlayerCommand::VolumeUp).await
    }

    pub async fn volume_down(&self) -> MassResult<()> {
        self.command(PlayerCommand::VolumeDown).await
    }

    pub async fn turn_on(&self) -> MassResult<()> {
        self.command(PlayerCommand::PowerOn).await
    }

    pub async fn turn_off(&self) -> MassResult<()> {
        self.command(PlayerCommand::PowerOff).await
    }

    pub async fn set_shuffle(&self, shuffle: bool) -> MassResult<()> {
        Ok(self.client.queue_set_shuffle(&self.player_id, shuffle).await?)
    }

    pub async fn clear_playlist(&self) -> MassResult<()> {
        Ok(self.client.queue_clear(&self.player_id).await?)
    }

    /// Play (or with `enqueue`, append) a media item
    ///
    /// Accepts media source URIs, `{provider}###{item_id}` ids of a playable
    /// type, library playlist names and plain http(s) URLs. Anything else is
    /// logged and ignored.
    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub async fn play_media(&self, media_type: &str, media_id: &str, enqueue: bool) -> MassResult<()> {
        let option = if enqueue {
            QueueOption::Add
        } else {
            QueueOption::Play
        };

        if media_id.starts_with(MASS_URI_SCHEME) {
            let uri = parse_uri(media_id)?;
            return self.play(&uri.media_ref(), option).await;
        }

        if is_playable(media_type) {
            if let Some((provider, item_id)) = split_content_id(media_id) {
                let media = MediaRef {
                    media_type: media_type.to_string(),
                    provider: provider.to_string(),
                    item_id: item_id.to_string(),
                };
                return self.play(&media, option).await;
            }
        }

        if media_type == MEDIA_TYPE_PLAYLIST {
            let playlists = self.client.get_library_playlists().await?;
            return match playlists.iter().find(|p| p.name == media_id) {
                Some(playlist) => self.play(&playlist.media_ref(), option).await,
                None => {
                    warn!(playlist = %media_id, "Playlist not found in library");
                    Ok(())
                }
            };
        }

        if media_id.starts_with("http") {
            return Ok(self.client.play_uri(&self.player_id, media_id).await?);
        }

        warn!(media_type = %media_type, media_id = %media_id, "Unsupported media");
        Ok(())
    }

    async fn play(&self, media: &MediaRef, option: QueueOption) -> MassResult<()> {
        Ok(self.client.play_media(&self.player_id, media, option).await?)
    }
}

/// Creates and tracks the media player entities of one config entry
pub struct MediaPlayerPlatform {
    hub: Hub,
    client: Arc<dyn MusicAssistantClient>,
    players: DashMap<String, Arc<MassPlayer>>,
    player_tasks: DashMap<String, JoinHandle<()>>,
}

impl MediaPlayerPlatform {
    pub fn new(hub: Hub, client: Arc<dyn MusicAssistantClient>) -> Arc<Self> {
        Arc::new(Self {
            hub,
            client,
            players: DashMap::new(),
            player_tasks: DashMap::new(),
        })
    }

    /// Start listening for player signals
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let mut players = self.hub.dispatcher.connect(DISPATCH_KEY_PLAYERS);
        let mut removals = self.hub.dispatcher.connect(DISPATCH_KEY_PLAYER_REMOVED);
        let platform = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    r = players.recv_typed::<Player>() => {
                        let Some(platform) = platform.upgrade() else { break };
                        match r {
                            Ok(player) => platform.update_media_player(player).await,
                            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Player signal lagged"),
                            Err(RecvError::Closed) => break,
                        }
                    }
                    r = removals.recv_typed::<String>() => {
                        let Some(platform) = platform.upgrade() else { break };
                        match r {
                            Ok(player_id) => platform.remove_media_player(&player_id).await,
                            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Removal signal lagged"),
                            Err(RecvError::Closed) => break,
                        }
                    }
                }
            }
        })
    }

    /// Add a newly seen player or forward an update to a known one
    ///
    /// Players that are unavailable when first seen are not added.
    pub async fn update_media_player(&self, player: Player) {
        if self.players.contains_key(&player.player_id) {
            self.hub
                .dispatcher
                .send(&player_update_signal(&player.player_id), &player);
            return;
        }
        if !player.available {
            debug!(player_id = %player.player_id, "Ignoring unavailable new player");
            return;
        }

        let player_id = player.player_id.clone();
        let mass_player = match MassPlayer::new(self.client.clone(), self.hub.states.clone(), player) {
            Ok(p) => p,
            Err(e) => {
                warn!(player_id = %player_id, error = %e, "Cannot create media player");
                return;
            }
        };
        self.players.insert(player_id.clone(), mass_player.clone());
        let task = mass_player.added(&self.hub.dispatcher).await;
        self.player_tasks.insert(player_id.clone(), task);
        info!(player_id = %player_id, entity_id = %mass_player.entity_id(), "Added media player");
    }

    pub async fn remove_media_player(&self, player_id: &str) {
        let player = self.players.get(player_id).map(|p| p.value().clone());
        if let Some(player) = player {
            debug!(player_id = %player_id, "Marking removed player unavailable");
            player.mark_unavailable().await;
        }
    }

    pub fn get(&self, player_id: &str) -> Option<Arc<MassPlayer>> {
        self.players.get(player_id).map(|p| p.value().clone())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Stop every player's listener
    pub fn shutdown(&self) {
        for task in self.player_tasks.iter() {
            task.abort();
        }
        self.player_tasks.clear();
    }
}
