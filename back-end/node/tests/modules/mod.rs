pub mod network;
pub mod query;
