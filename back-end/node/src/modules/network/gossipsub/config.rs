use crate::utils::env::{env_bool, env_duration_ms, env_usize};
use libp2p::gossipsub::{self, MessageAuthenticity, ValidationMode};
use libp2p::identity::Keypair;
use std::time::Duration;
use tracing::info;

/// One expertise record with a handful of 768-wide vectors runs to tens of KiB.
pub const DEFAULT_MAX_TRANSMIT_SIZE: usize = 1024 * 1024;

/// Configuration for GossipSub protocol
#[derive(Debug, Clone)]
pub struct GossipSubConfig {
    /// Enable GossipSub protocol
    pub enabled: bool,

    /// Heartbeat interval for mesh maintenance
    pub heartbeat_interval: Duration,

    /// Target number of peers in mesh for each topic
    pub mesh_n: usize,

    /// Minimum peers in mesh before emitting GRAFT
    pub mesh_n_low: usize,

    /// Maximum peers in mesh before emitting PRUNE
    pub mesh_n_high: usize,

    /// Number of peers to gossip to (outside mesh)
    pub gossip_lazy: usize,

    /// Duplicate message cache time
    pub duplicate_cache_time: Duration,

    /// Maximum message size in bytes
    pub max_transmit_size: usize,
}

impl Default for GossipSubConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            heartbeat_interval: Duration::from_secs(1),
            mesh_n: 6,
            mesh_n_low: 4,
            mesh_n_high: 12,
            gossip_lazy: 6,
            duplicate_cache_time: Duration::from_secs(60),
            max_transmit_size: DEFAULT_MAX_TRANSMIT_SIZE,
        }
    }
}

impl GossipSubConfig {
    /// Load configuration from `GOSSIPSUB_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            enabled: env_bool("GOSSIPSUB_ENABLED", defaults.enabled),
            heartbeat_interval: env_duration_ms("GOSSIPSUB_HEARTBEAT_INTERVAL_MS", 1000),
            mesh_n: env_usize("GOSSIPSUB_MESH_N", defaults.mesh_n),
            mesh_n_low: env_usize("GOSSIPSUB_MESH_N_LOW", defaults.mesh_n_low),
            mesh_n_high: env_usize("GOSSIPSUB_MESH_N_HIGH", defaults.mesh_n_high),
            max_transmit_size: env_usize("GOSSIPSUB_MAX_MESSAGE_SIZE", defaults.max_transmit_size),
            ..defaults
        };

        info!(
            enabled = config.enabled,
            heartbeat_interval_ms = config.heartbeat_interval.as_millis(),
            mesh_n = config.mesh_n,
            max_message_size = config.max_transmit_size,
            "GossipSub configuration loaded"
        );

        config
    }

    /// Build a libp2p GossipSub behaviour from this config
    ///
    /// Messages are always signed. The default message id is author plus
    /// sequence number, so re-sending identical bytes yields a new id and is
    /// never rejected as a duplicate.
    pub fn build_behaviour(&self, keypair: &Keypair) -> Result<gossipsub::Behaviour, String> {
        let config = gossipsub::ConfigBuilder::default()
            .heartbeat_interval(self.heartbeat_interval)
            .mesh_n(self.mesh_n)
            .mesh_n_low(self.mesh_n_low)
            .mesh_n_high(self.mesh_n_high)
            .gossip_lazy(self.gossip_lazy)
            .max_transmit_size(self.max_transmit_size)
            .duplicate_cache_time(self.duplicate_cache_time)
            .validation_mode(ValidationMode::Strict)
            .build()
            .map_err(|e| format!("Invalid GossipSub config: {e}"))?;

        gossipsub::Behaviour::new(MessageAuthenticity::Signed(keypair.clone()), config)
            .map_err(|e| format!("Failed to create GossipSub behaviour: {e}"))
    }
}
