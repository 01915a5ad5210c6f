use super::codec::DEFAULT_MAX_MESSAGE_SIZE;
use crate::utils::env::{env_duration_secs, env_usize};
use std::time::Duration;
use tracing::info;

/// Configuration for the query request-response protocol
#[derive(Debug, Clone)]
pub struct QueryProtocolConfig {
    /// Outer timeout for one request/response exchange
    pub request_timeout: Duration,

    /// Largest accepted message in either direction
    pub max_message_size: usize,
}

impl Default for QueryProtocolConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl QueryProtocolConfig {
    /// Load configuration from environment variables
    ///
    /// - QUERY_REQUEST_TIMEOUT_SECS (default: 30)
    /// - QUERY_MAX_MESSAGE_SIZE (default: 4 MiB)
    pub fn from_env() -> Self {
        let config = Self {
            request_timeout: env_duration_secs("QUERY_REQUEST_TIMEOUT_SECS", 30),
            max_message_size: env_usize("QUERY_MAX_MESSAGE_SIZE", DEFAULT_MAX_MESSAGE_SIZE),
        };

        info!(
            request_timeout_secs = config.request_timeout.as_secs(),
            max_message_size = config.max_message_size,
            "Query protocol configuration loaded"
        );

        config
    }
}
