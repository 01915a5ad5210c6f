//! Expertise gossip: broadcast local records, surface records heard from peers.

mod channel;
mod envelope;
mod error;
mod notifier;
mod publisher;
mod subscriber;

pub use channel::{BroadcastChannel, SwarmTopic};
pub use envelope::{decode, encode};
pub use error::{GossipError, NotifyError};
pub use notifier::{ExpertiseNotifier, HttpNotifier, NotificationQueue, NotificationQueueConfig};
pub use publisher::{GossipPublisher, SweepSummary};
pub use subscriber::GossipSubscriber;
