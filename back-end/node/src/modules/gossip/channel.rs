use super::error::GossipError;
use crate::modules::network::manager::NetworkManager;
use async_trait::async_trait;
use std::sync::Arc;

/// Publish side of the pub/sub substrate, bound to one topic.
#[async_trait]
pub trait BroadcastChannel: Send + Sync {
    async fn publish(&self, payload: Vec<u8>) -> Result<(), GossipError>;
}

/// The node's GossipSub topic, reached through the network manager.
#[derive(Debug, Clone)]
pub struct SwarmTopic {
    network: Arc<NetworkManager>,
    topic: String,
}

impl SwarmTopic {
    pub fn new(network: Arc<NetworkManager>, topic: impl Into<String>) -> Self {
        Self {
            network,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl BroadcastChannel for SwarmTopic {
    async fn publish(&self, payload: Vec<u8>) -> Result<(), GossipError> {
        self.network.publish(&self.topic, payload).await
    }
}
