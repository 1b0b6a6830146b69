//! Error types for the gateway crate

use thiserror::Error;

/// Transport-level errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Establishing a connection failed. Handled by the supervisor's backoff
    /// loop and never surfaced past it.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The live connection dropped
    #[error("Connection closed")]
    ConnectionClosed,

    /// No connection is currently established
    #[error("Not connected")]
    NotConnected,

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Gateway-level errors
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Subscription replay could not read the known mints
    #[error("Replay failed: {0}")]
    Replay(String),
}
