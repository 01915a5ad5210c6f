pub mod expertise;
pub mod gossip;
pub mod network;
pub mod query;
