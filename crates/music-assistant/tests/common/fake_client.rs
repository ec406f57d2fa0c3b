//! In-memory Music Assistant client
//!
//! Records everything the integration sends and lets a test push events and
//! control states the way a server would.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mass_client::{
    BoxError, ClientError, ClientFactory, ClientResult, ControlCallback, ControlState,
    EventCallback, EventKind, MassEvent, MediaItem, MediaRef, MusicAssistantClient, Player,
    PlayerCommand, PlayerControlRegistration, PlayerQueue, QueueOption, ServerConfig,
};

#[derive(Default)]
struct FakeState {
    connect_calls: usize,
    close_calls: usize,
    connect_error: Option<ClientError>,
    players: Vec<Player>,
    queues: HashMap<String, PlayerQueue>,
    playlists: Vec<MediaItem>,
    registrations: Vec<PlayerControlRegistration>,
    control_callbacks: HashMap<String, ControlCallback>,
    control_updates: Vec<(String, ControlState)>,
    update_error: Option<ClientError>,
    failing_controls: HashMap<String, ClientError>,
    event_callbacks: Vec<(EventCallback, Vec<EventKind>)>,
    commands: Vec<(String, PlayerCommand)>,
    played: Vec<(String, MediaRef, QueueOption)>,
    played_uris: Vec<(String, String)>,
    shuffles: Vec<(String, bool)>,
    cleared: Vec<String>,
}

pub struct FakeClient {
    host: String,
    state: Mutex<FakeState>,
}

impl FakeClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            host: "mass.local".to_string(),
            state: Mutex::new(FakeState::default()),
        })
    }

    pub fn add_player(&self, player: Player) {
        self.state.lock().unwrap().players.push(player);
    }

    pub fn set_queue(&self, queue: PlayerQueue) {
        self.state
            .lock()
            .unwrap()
            .queues
            .insert(queue.queue_id.clone(), queue);
    }

    pub fn add_playlist(&self, playlist: MediaItem) {
        self.state.lock().unwrap().playlists.push(playlist);
    }

    pub fn fail_connect(&self, error: ClientError) {
        self.state.lock().unwrap().connect_error = Some(error);
    }

    pub fn fail_updates(&self, error: ClientError) {
        self.state.lock().unwrap().update_error = Some(error);
    }

    /// Reject updates for one control only
    pub fn fail_updates_for(&self, control_id: &str, error: ClientError) {
        self.state
            .lock()
            .unwrap()
            .failing_controls
            .insert(control_id.to_string(), error);
    }

    /// Deliver an event to every callback subscribed to its kind
    pub async fn emit(&self, event: MassEvent) {
        let callbacks: Vec<EventCallback> = self
            .state
            .lock()
            .unwrap()
            .event_callbacks
            .iter()
            .filter(|(_, kinds)| kinds.contains(&event.kind()))
            .map(|(cb, _)| cb.clone())
            .collect();
        for callback in callbacks {
            callback(event.clone()).await;
        }
    }

    /// Invoke a registered control's callback as the server would
    pub async fn push_control_state(
        &self,
        control_id: &str,
        state: ControlState,
    ) -> Result<(), BoxError> {
        let callback = self
            .state
            .lock()
            .unwrap()
            .control_callbacks
            .get(control_id)
            .cloned()
            .unwrap_or_else(|| panic!("no callback registered for {}", control_id));
        callback(state).await
    }

    pub fn registrations(&self) -> Vec<PlayerControlRegistration> {
        self.state.lock().unwrap().registrations.clone()
    }

    pub fn registered_ids(&self) -> Vec<String> {
        self.registrations()
            .into_iter()
            .map(|r| r.control_id)
            .collect()
    }

    pub fn control_updates(&self) -> Vec<(String, ControlState)> {
        self.state.lock().unwrap().control_updates.clone()
    }

    pub fn clear_control_updates(&self) {
        self.state.lock().unwrap().control_updates.clear();
    }

    pub fn subscribed_kinds(&self) -> Vec<EventKind> {
        self.state
            .lock()
            .unwrap()
            .event_callbacks
            .iter()
            .flat_map(|(_, kinds)| kinds.clone())
            .collect()
    }

    pub fn commands(&self) -> Vec<(String, PlayerCommand)> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn played(&self) -> Vec<(String, MediaRef, QueueOption)> {
        self.state.lock().unwrap().played.clone()
    }

    pub fn played_uris(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().played_uris.clone()
    }

    pub fn shuffles(&self) -> Vec<(String, bool)> {
        self.state.lock().unwrap().shuffles.clone()
    }

    pub fn cleared(&self) -> Vec<String> {
        self.state.lock().unwrap().cleared.clone()
    }

    pub fn connect_calls(&self) -> usize {
        self.state.lock().unwrap().connect_calls
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }
}

#[async_trait]
impl MusicAssistantClient for FakeClient {
    fn server_id(&self) -> String {
        "fake-server".to_string()
    }

    fn host(&self) -> String {
        self.host.clone()
    }

    async fn connect(&self, _auto_retry: bool) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        state.connect_calls += 1;
        match state.connect_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn close(&self) -> ClientResult<()> {
        self.state.lock().unwrap().close_calls += 1;
        Ok(())
    }

    fn register_event_callback(&self, callback: EventCallback, kinds: &[EventKind]) {
        self.state
            .lock()
            .unwrap()
            .event_callbacks
            .push((callback, kinds.to_vec()));
    }

    async fn get_players(&self) -> ClientResult<Vec<Player>> {
        Ok(self.state.lock().unwrap().players.clone())
    }

    async fn get_player_queue(&self, player_id: &str) -> ClientResult<PlayerQueue> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .queues
            .get(player_id)
            .cloned()
            .unwrap_or(PlayerQueue {
                queue_id: player_id.to_string(),
                cur_item: None,
                cur_item_time: None,
                shuffle_enabled: false,
            }))
    }

    async fn register_player_control(
        &self,
        registration: PlayerControlRegistration,
        callback: ControlCallback,
    ) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .control_callbacks
            .insert(registration.control_id.clone(), callback);
        state.registrations.push(registration);
        Ok(())
    }

    async fn update_player_control(
        &self,
        control_id: &str,
        control_state: ControlState,
    ) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.update_error.clone() {
            return Err(error);
        }
        if let Some(error) = state.failing_controls.get(control_id).cloned() {
            return Err(error);
        }
        state
            .control_updates
            .push((control_id.to_string(), control_state));
        Ok(())
    }

    async fn player_command(&self, player_id: &str, command: PlayerCommand) -> ClientResult<()> {
        self.state
            .lock()
            .unwrap()
            .commands
            .push((player_id.to_string(), command));
        Ok(())
    }

    async fn queue_set_shuffle(&self, player_id: &str, enabled: bool) -> ClientResult<()> {
        self.state
            .lock()
            .unwrap()
            .shuffles
            .push((player_id.to_string(), enabled));
        Ok(())
    }

    async fn queue_clear(&self, player_id: &str) -> ClientResult<()> {
        self.state
            .lock()
            .unwrap()
            .cleared
            .push(player_id.to_string());
        Ok(())
    }

    async fn play_media(
        &self,
        player_id: &str,
        media: &MediaRef,
        option: QueueOption,
    ) -> ClientResult<()> {
        self.state
            .lock()
            .unwrap()
            .played
            .push((player_id.to_string(), media.clone(), option));
        Ok(())
    }

    async fn play_uri(&self, player_id: &str, uri: &str) -> ClientResult<()> {
        self.state
            .lock()
            .unwrap()
            .played_uris
            .push((player_id.to_string(), uri.to_string()));
        Ok(())
    }

    async fn get_library_playlists(&self) -> ClientResult<Vec<MediaItem>> {
        Ok(self.state.lock().unwrap().playlists.clone())
    }

    async fn media_item_image_url(&self, item: &MediaItem) -> ClientResult<Option<String>> {
        Ok(Some(format!("http://{}/image/{}", self.host, item.item_id)))
    }
}

/// Hands out the same fake client for every config and records the configs
pub struct FakeFactory {
    pub client: Arc<FakeClient>,
    configs: Mutex<Vec<ServerConfig>>,
}

impl FakeFactory {
    pub fn new(client: Arc<FakeClient>) -> Arc<Self> {
        Arc::new(Self {
            client,
            configs: Mutex::new(Vec::new()),
        })
    }

    pub fn configs(&self) -> Vec<ServerConfig> {
        self.configs.lock().unwrap().clone()
    }
}

impl ClientFactory for FakeFactory {
    fn create(&self, config: &ServerConfig) -> Arc<dyn MusicAssistantClient> {
        self.configs.lock().unwrap().push(config.clone());
        self.client.clone()
    }
}
