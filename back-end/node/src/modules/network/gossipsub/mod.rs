mod config;
mod message;
mod subscription;

pub use config::{DEFAULT_MAX_TRANSMIT_SIZE, GossipSubConfig};
pub use message::GossipMessage;
pub use subscription::{DEFAULT_CHANNEL_BUFFER, SubscriptionHandle, TopicSubscriptionManager};
