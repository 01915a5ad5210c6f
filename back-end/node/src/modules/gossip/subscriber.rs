use super::envelope;
use super::notifier::NotificationQueue;
use crate::modules::network::gossipsub::{GossipMessage, SubscriptionHandle};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Consumes the gossip subscription and forwards decoded expertise to the notifier.
///
/// The reported `nodeId` is the message's signed author rather than the
/// neighbour that relayed it, so the client API can use it directly as a
/// query target.
pub struct GossipSubscriber {
    subscription: SubscriptionHandle,
    notifications: Option<NotificationQueue>,
}

impl GossipSubscriber {
    /// `notifications` is `None` when no client API is configured.
    pub fn new(subscription: SubscriptionHandle, notifications: Option<NotificationQueue>) -> Self {
        Self {
            subscription,
            notifications,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Receive until the subscription is closed for good.
    pub async fn run(mut self) {
        info!(topic = %self.subscription.topic, "Listening for gossiped expertise");

        loop {
            match self.subscription.recv().await {
                Ok(message) => self.on_message(message),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Gossip subscriber lagged, messages were missed");
                }
                Err(RecvError::Closed) => {
                    error!(
                        topic = %self.subscription.topic,
                        "Gossip subscription closed, no further expertise will be received"
                    );
                    break;
                }
            }
        }
    }

    fn on_message(&self, message: GossipMessage) {
        let expertise = match envelope::decode(&message.data) {
            Ok(expertise) => expertise,
            Err(e) => {
                warn!(
                    source = %message.source,
                    error = %e,
                    "Failed to decode gossiped expertise"
                );
                return;
            }
        };

        info!(
            source = %message.source,
            embeddings = expertise.len(),
            "Received gossiped expertise"
        );

        match &self.notifications {
            Some(queue) => {
                queue.submit(message.source.to_string(), expertise);
            }
            None => debug!("No client API configured, skipping notification"),
        }
    }
}
