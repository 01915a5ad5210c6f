use super::message::GossipMessage;
use std::collections::HashMap;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

/// Messages buffered per topic before a slow subscriber starts lagging.
pub const DEFAULT_CHANNEL_BUFFER: usize = 1024;

/// Handle for receiving messages from a subscribed topic
pub struct SubscriptionHandle {
    pub topic: String,
    pub receiver: broadcast::Receiver<GossipMessage>,
}

impl SubscriptionHandle {
    /// Receive next message (async)
    pub async fn recv(&mut self) -> Result<GossipMessage, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Try to receive without blocking
    pub fn try_recv(&mut self) -> Result<GossipMessage, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

/// Per-topic subscription channel
struct TopicChannel {
    sender: broadcast::Sender<GossipMessage>,
    subscriber_count: usize,
}

/// Fans GossipSub messages out to local subscribers, one broadcast channel per topic.
pub struct TopicSubscriptionManager {
    channels: RwLock<HashMap<String, TopicChannel>>,
    channel_buffer_size: usize,
}

impl std::fmt::Debug for TopicSubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicSubscriptionManager")
            .field("channel_buffer_size", &self.channel_buffer_size)
            .finish_non_exhaustive()
    }
}

impl TopicSubscriptionManager {
    pub fn new(channel_buffer_size: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            channel_buffer_size: channel_buffer_size.max(1),
        }
    }

    /// Subscribe to a topic, returns a handle for receiving messages
    pub async fn subscribe(&self, topic: impl Into<String>) -> SubscriptionHandle {
        let topic = topic.into();
        let mut channels = self.channels.write().await;

        let receiver = if let Some(channel) = channels.get_mut(&topic) {
            channel.subscriber_count += 1;
            debug!(
                topic = %topic,
                subscribers = channel.subscriber_count,
                "Added subscriber to existing topic channel"
            );
            channel.sender.subscribe()
        } else {
            let (sender, receiver) = broadcast::channel(self.channel_buffer_size);
            channels.insert(
                topic.clone(),
                TopicChannel {
                    sender,
                    subscriber_count: 1,
                },
            );
            info!(topic = %topic, "Created new topic channel");
            receiver
        };

        SubscriptionHandle { topic, receiver }
    }

    /// Drop one subscriber; the channel closes when the last one leaves
    pub async fn unsubscribe(&self, topic: &str) {
        let mut channels = self.channels.write().await;

        if let Some(channel) = channels.get_mut(topic) {
            channel.subscriber_count = channel.subscriber_count.saturating_sub(1);

            if channel.subscriber_count == 0 {
                channels.remove(topic);
                info!(topic = %topic, "Removed empty topic channel");
            }
        }
    }

    /// Deliver a message to its topic channel.
    /// Returns true if at least one live receiver got it.
    pub async fn route(&self, message: GossipMessage) -> bool {
        let channels = self.channels.read().await;

        let Some(channel) = channels.get(&message.topic) else {
            debug!(topic = %message.topic, "No subscribers for topic");
            return false;
        };

        match channel.sender.send(message) {
            Ok(receivers) => {
                debug!(receivers, "Message routed to subscribers");
                true
            }
            Err(broadcast::error::SendError(message)) => {
                debug!(topic = %message.topic, "No active receivers for topic");
                false
            }
        }
    }

    pub async fn has_subscribers(&self, topic: &str) -> bool {
        self.channels.read().await.contains_key(topic)
    }

    pub async fn subscriber_count(&self, topic: &str) -> usize {
        let channels = self.channels.read().await;
        channels.get(topic).map(|c| c.subscriber_count).unwrap_or(0)
    }
}

impl Default for TopicSubscriptionManager {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_BUFFER)
    }
}
