//! Integration errors

use ha_config_entries::ConfigEntriesError;
use ha_core::EntityIdError;
use ha_hub::ServiceError;
use mass_client::ClientError;
use thiserror::Error;

pub type MassResult<T> = Result<T, MassError>;

#[derive(Debug, Error)]
pub enum MassError {
    /// Credentials rejected or server unreachable during authentication
    #[error("invalid authentication")]
    InvalidAuth,

    #[error("Music Assistant client error: {0}")]
    Client(#[from] ClientError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("unknown player control: {0}")]
    UnknownControl(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid media id: {0}")]
    InvalidMedia(String),

    #[error(transparent)]
    ConfigEntries(#[from] ConfigEntriesError),

    #[error("invalid entity id: {0}")]
    EntityId(#[from] EntityIdError),
}

impl MassError {
    /// Error key shown in a config flow form's `base` slot
    pub fn flow_error_key(&self) -> &'static str {
        match self {
            MassError::InvalidAuth => "invalid_auth",
            _ => "unknown",
        }
    }
}
