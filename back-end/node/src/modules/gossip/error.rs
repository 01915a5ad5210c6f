//! Error types for expertise gossip.

use thiserror::Error;

/// Errors raised while pushing expertise onto the broadcast channel.
#[derive(Debug, Error)]
pub enum GossipError {
    /// The record could not be encoded.
    #[error("Failed to serialize expertise: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The gossip topic has not been joined yet (network not running).
    #[error("Gossip topic not joined: {message}")]
    NotJoined { message: String },

    /// The topic was joined but no peer is subscribed to it.
    #[error("No peers subscribed to topic {topic}")]
    NoPeers { topic: String },

    /// The broadcast substrate rejected the message.
    #[error("Broadcast channel rejected message: {message}")]
    Channel { message: String },
}

impl GossipError {
    /// True when the failure only means nobody could hear the message yet.
    ///
    /// The local ingest already happened, and the periodic sweep re-sends the
    /// record once peers show up.
    pub fn is_unheard(&self) -> bool {
        matches!(self, Self::NotJoined { .. } | Self::NoPeers { .. })
    }
}

/// Errors raised by the client-API notifier.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to notify client API: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Client API returned error status: {status}")]
    Status { status: u16 },

    #[error("Notification timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}
