//! Player controls
//!
//! A player control is a knob the server can turn on a device it doesn't
//! own: switching an amplifier on before playback, or following a receiver's
//! volume. Controls are registered with a callback the server invokes to push
//! a new state; the owner reports local changes back with
//! [`MusicAssistantClient::update_player_control`](crate::MusicAssistantClient::update_player_control).

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Error type returned by control callbacks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Callback the server invokes to set a control's state
pub type ControlCallback =
    Arc<dyn Fn(ControlState) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Wrap an async closure as a [`ControlCallback`]
pub fn control_callback<F, Fut>(f: F) -> ControlCallback
where
    F: Fn(ControlState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    Arc::new(move |state| Box::pin(f(state)))
}

/// Kind of player control, encoded on the wire as 0 (power) or 1 (volume)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PlayerControlType {
    Power,
    Volume,
}

impl From<PlayerControlType> for u8 {
    fn from(value: PlayerControlType) -> u8 {
        match value {
            PlayerControlType::Power => 0,
            PlayerControlType::Volume => 1,
        }
    }
}

impl TryFrom<u8> for PlayerControlType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlayerControlType::Power),
            1 => Ok(PlayerControlType::Volume),
            other => Err(format!("unknown player control type {}", other)),
        }
    }
}

/// State value of a control: on/off for power, 0-100 for volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlState {
    Power(bool),
    Volume(f64),
}

impl ControlState {
    /// Truthiness of the state; a non-zero volume counts as on
    pub fn is_on(&self) -> bool {
        match *self {
            ControlState::Power(on) => on,
            ControlState::Volume(level) => level != 0.0,
        }
    }

    /// Numeric value on the 0-100 scale; power maps to 0 or 100
    pub fn level(&self) -> f64 {
        match *self {
            ControlState::Power(true) => 100.0,
            ControlState::Power(false) => 0.0,
            ControlState::Volume(level) => level,
        }
    }
}

/// Descriptor sent to the server when registering a control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerControlRegistration {
    pub control_type: PlayerControlType,
    pub control_id: String,
    pub provider_name: String,
    pub name: String,
    pub state: ControlState,
}
