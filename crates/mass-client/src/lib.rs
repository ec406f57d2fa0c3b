//! Music Assistant client interface
//!
//! The integration talks to a Music Assistant server through the
//! [`MusicAssistantClient`] trait. Transport, authentication and reconnect
//! handling belong to the implementation; this crate fixes the calls the
//! integration makes and the payloads it receives.

mod client;
mod config;
mod controls;
mod error;
mod events;
mod models;

pub use client::{ClientFactory, EventCallback, MusicAssistantClient};
pub use config::{ServerConfig, DEFAULT_PORT, DEFAULT_USERNAME};
pub use controls::{
    control_callback, BoxError, ControlCallback, ControlState, PlayerControlRegistration,
    PlayerControlType,
};
pub use error::{ClientError, ClientResult};
pub use events::{event_callback, EventKind, MassEvent};
pub use models::{
    AlbumRef, ArtistRef, DeviceInfo, MediaItem, MediaRef, PlaybackState, Player, PlayerCommand,
    PlayerQueue, QueueOption, QueueTimeUpdate,
};
