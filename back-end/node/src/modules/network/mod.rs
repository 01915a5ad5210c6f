pub mod behaviour;
pub mod config;
pub mod gossipsub;
pub mod keypair;
pub mod manager;
pub mod query_protocol;
