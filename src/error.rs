//! Feed client error types

use crate::message::MessageError;
use thiserror::Error;

/// Feed client error type
#[derive(Error, Debug)]
pub enum FeedError {
    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Relay message error
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    /// Event is missing a required field
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// Timeout error
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Not connected to any relay
    #[error("Not connected to any relay")]
    NotConnected,
}

/// Feed client result type
pub type Result<T> = std::result::Result<T, FeedError>;
