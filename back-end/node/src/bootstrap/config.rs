use crate::modules::gossip::NotificationQueueConfig;
use crate::utils::env::{
    env_duration_secs, env_list, env_string, env_string_opt, env_u16, env_u64, env_usize,
};
use errors::AppError;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_GOSSIP_TOPIC: &str = "/rag-topics";

/// Process configuration, loaded from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub local_search: LocalSearchConfig,
    pub client_api: ClientApiConfig,
    pub gossip: GossipConfig,

    /// Base64 protobuf-encoded libp2p private key. Generated when unset.
    pub node_private_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub rest_port: u16,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// External vector-search service
#[derive(Debug, Clone)]
pub struct LocalSearchConfig {
    pub url: String,
    pub timeout: Duration,
}

/// Client API notified about gossiped expertise
#[derive(Debug, Clone)]
pub struct ClientApiConfig {
    /// Notifications are disabled when unset
    pub url: Option<String>,
    pub queue: NotificationQueueConfig,
}

#[derive(Debug, Clone)]
pub struct GossipConfig {
    pub topic: String,
    pub republish_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let queue_defaults = NotificationQueueConfig::default();

        let config = Self {
            server: ServerConfig {
                rest_port: env_u16("REST_PORT", 8888),
            },
            cors: CorsConfig {
                allowed_origins: env_list("CORS_ALLOWED_ORIGINS"),
                allow_credentials: false,
            },
            local_search: LocalSearchConfig {
                url: env_string("LOCAL_SEARCH_URL", "http://localhost:9999"),
                timeout: env_duration_secs("LOCAL_SEARCH_TIMEOUT_SECS", 10),
            },
            client_api: ClientApiConfig {
                url: env_string_opt("CLIENT_API_URL"),
                queue: NotificationQueueConfig {
                    capacity: env_usize("NOTIFY_QUEUE_CAPACITY", queue_defaults.capacity),
                    max_in_flight: env_usize("NOTIFY_MAX_IN_FLIGHT", queue_defaults.max_in_flight),
                    timeout: env_duration_secs(
                        "NOTIFY_TIMEOUT_SECS",
                        queue_defaults.timeout.as_secs(),
                    ),
                },
            },
            gossip: GossipConfig {
                topic: env_string("GOSSIP_TOPIC", DEFAULT_GOSSIP_TOPIC),
                republish_interval: Duration::from_secs(env_u64(
                    "GOSSIP_REPUBLISH_INTERVAL_SECS",
                    10,
                )),
            },
            node_private_key: env_string_opt("NODE_PRIVATE_KEY"),
        };

        config.validate()?;

        info!(
            rest_port = config.server.rest_port,
            local_search_url = %config.local_search.url,
            client_api_url = ?config.client_api.url,
            gossip_topic = %config.gossip.topic,
            republish_interval_secs = config.gossip.republish_interval.as_secs(),
            "Configuration loaded"
        );

        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        validate_url("LOCAL_SEARCH_URL", &self.local_search.url)?;
        if let Some(url) = &self.client_api.url {
            validate_url("CLIENT_API_URL", url)?;
        }
        if self.gossip.topic.is_empty() {
            return Err(AppError::Config("GOSSIP_TOPIC must not be empty".to_string()));
        }
        if self.gossip.republish_interval.is_zero() {
            return Err(AppError::Config(
                "GOSSIP_REPUBLISH_INTERVAL_SECS must be greater than 0".to_string(),
            ));
        }
        if self.local_search.timeout.is_zero() {
            return Err(AppError::Config(
                "LOCAL_SEARCH_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }
        if self.client_api.queue.timeout.is_zero() {
            return Err(AppError::Config(
                "NOTIFY_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }
        if self.client_api.queue.capacity == 0 || self.client_api.queue.max_in_flight == 0 {
            return Err(AppError::Config(
                "NOTIFY_QUEUE_CAPACITY and NOTIFY_MAX_IN_FLIGHT must be greater than 0"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_url(key: &str, value: &str) -> Result<(), AppError> {
    reqwest::Url::parse(value)
        .map(|_| ())
        .map_err(|e| AppError::Config(format!("{key} is not a valid URL ({value}): {e}")))
}
