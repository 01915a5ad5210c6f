use libp2p::PeerId;
use libp2p::gossipsub;

/// A GossipSub payload as delivered to local subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct GossipMessage {
    pub topic: String,

    /// The peer the message is attributed to.
    pub source: PeerId,

    pub data: Vec<u8>,
}

impl GossipMessage {
    /// Attribute to the signing author, or to the forwarding peer for
    /// unsigned messages.
    pub fn from_gossipsub(message: gossipsub::Message, propagation_source: PeerId) -> Self {
        Self {
            topic: message.topic.to_string(),
            source: message.source.unwrap_or(propagation_source),
            data: message.data,
        }
    }
}
