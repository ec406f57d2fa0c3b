//! Client error types

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Errors reported by a Music Assistant client
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The server rejected the username/password
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The server could not be reached
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A call was made while no connection is established
    #[error("not connected")]
    NotConnected,

    /// The server answered a command with an error
    #[error("command {command} failed: {reason}")]
    CommandFailed { command: String, reason: String },

    /// The server sent something the client could not parse
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Whether the error means the credentials or server address are wrong
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidCredentials | ClientError::ConnectionFailed(_)
        )
    }
}
