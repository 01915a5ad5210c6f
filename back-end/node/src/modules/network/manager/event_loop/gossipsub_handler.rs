//! GossipSub event handler - message receiving and subscription events

use super::NetworkEventLoop;
use crate::modules::network::gossipsub::GossipMessage;
use libp2p::gossipsub;
use tracing::{debug, info};

impl NetworkEventLoop {
    pub(crate) async fn handle_gossipsub_event(&mut self, event: gossipsub::Event) {
        match event {
            gossipsub::Event::Message {
                propagation_source,
                message_id,
                message,
            } => {
                debug!(
                    source = %propagation_source,
                    message_id = %message_id,
                    topic = %message.topic,
                    data_len = message.data.len(),
                    "GossipSub message received"
                );

                let message = GossipMessage::from_gossipsub(message, propagation_source);
                if !self.subscription_manager.route(message).await {
                    debug!(message_id = %message_id, "No local subscriber for message");
                }
            }

            gossipsub::Event::Subscribed { peer_id, topic } => {
                info!(peer_id = %peer_id, topic = %topic, "Peer subscribed to topic");
            }

            gossipsub::Event::Unsubscribed { peer_id, topic } => {
                info!(peer_id = %peer_id, topic = %topic, "Peer unsubscribed from topic");
            }

            gossipsub::Event::GossipsubNotSupported { peer_id } => {
                debug!(peer_id = %peer_id, "Peer does not support GossipSub");
            }

            _ => {}
        }
    }
}
