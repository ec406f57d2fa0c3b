//! The client trait

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::config::ServerConfig;
use crate::controls::{ControlCallback, ControlState, PlayerControlRegistration};
use crate::error::ClientResult;
use crate::events::{EventKind, MassEvent};
use crate::models::{MediaItem, MediaRef, Player, PlayerCommand, PlayerQueue, QueueOption};

/// Callback invoked for every subscribed server event
pub type EventCallback = Arc<dyn Fn(MassEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Connection to one Music Assistant server
///
/// Implementations own transport, authentication and reconnection. Events
/// arrive through the callbacks registered with
/// [`register_event_callback`](Self::register_event_callback), including a
/// `Connected` event after every (re)connect.
#[async_trait]
pub trait MusicAssistantClient: Send + Sync {
    /// Stable identifier of the server instance
    fn server_id(&self) -> String;

    /// Host the client connects to
    fn host(&self) -> String;

    /// Connect and authenticate
    ///
    /// With `auto_retry` the call keeps retrying until the connection is up
    /// or the client is closed; without it the first failure is returned.
    async fn connect(&self, auto_retry: bool) -> ClientResult<()>;

    async fn close(&self) -> ClientResult<()>;

    /// Subscribe `callback` to the given event kinds
    fn register_event_callback(&self, callback: EventCallback, kinds: &[EventKind]);

    async fn get_players(&self) -> ClientResult<Vec<Player>>;

    async fn get_player_queue(&self, player_id: &str) -> ClientResult<PlayerQueue>;

    /// Expose a control to the server; `callback` receives state pushed by the server
    async fn register_player_control(
        &self,
        registration: PlayerControlRegistration,
        callback: ControlCallback,
    ) -> ClientResult<()>;

    /// Report a control's new local state to the server
    async fn update_player_control(&self, control_id: &str, state: ControlState)
        -> ClientResult<()>;

    async fn player_command(&self, player_id: &str, command: PlayerCommand) -> ClientResult<()>;

    async fn queue_set_shuffle(&self, player_id: &str, enabled: bool) -> ClientResult<()>;

    async fn queue_clear(&self, player_id: &str) -> ClientResult<()>;

    async fn play_media(
        &self,
        player_id: &str,
        media: &MediaRef,
        option: QueueOption,
    ) -> ClientResult<()>;

    /// Play a plain URL
    async fn play_uri(&self, player_id: &str, uri: &str) -> ClientResult<()>;

    async fn get_library_playlists(&self) -> ClientResult<Vec<MediaItem>>;

    /// Image URL for an item, if the server has one
    async fn media_item_image_url(&self, item: &MediaItem) -> ClientResult<Option<String>>;
}

/// Builds clients from connection parameters
pub trait ClientFactory: Send + Sync {
    fn create(&self, config: &ServerConfig) -> Arc<dyn MusicAssistantClient>;
}
