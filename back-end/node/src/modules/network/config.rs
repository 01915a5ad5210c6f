use crate::modules::network::gossipsub::GossipSubConfig;
use crate::modules::network::query_protocol::QueryProtocolConfig;
use crate::utils::env::{env_bool, env_duration_secs, env_list, env_string, env_u16, env_u64};
use libp2p::Multiaddr;
use std::time::Duration;
use tracing::{info, warn};

/// Nodes announcing the same rendezvous string find each other through the DHT
pub const DEFAULT_RENDEZVOUS: &str = "/p2p-rag/expertise";

/// Configuration for the networking layer
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Listen over QUIC instead of TCP
    pub enable_quic: bool,

    /// Port to listen on (0 = OS assigns random port)
    pub listen_port: u16,

    /// Bootstrap peer addresses
    /// Format: "/ip4/1.2.3.4/udp/4001/quic-v1/p2p/12D3K..."
    pub bootstrap_peers: Vec<Multiaddr>,

    /// Addresses other peers can reach us on, handed out in provider records
    pub external_addresses: Vec<Multiaddr>,

    pub discovery: DiscoveryConfig,

    pub mdns: MdnsConfig,

    pub gossipsub: GossipSubConfig,

    pub query: QueryProtocolConfig,
}

/// Rendezvous discovery over Kademlia provider records
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// DHT key every node of the swarm provides and looks up
    pub rendezvous: String,

    /// Pause between provider lookups
    pub interval: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            rendezvous: DEFAULT_RENDEZVOUS.to_string(),
            interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MdnsConfig {
    pub enabled: bool,
    pub query_interval_secs: u64,
}

impl Default for MdnsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            query_interval_secs: 30,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            enable_quic: true,
            listen_port: 0,
            bootstrap_peers: Vec::new(),
            external_addresses: Vec::new(),
            discovery: DiscoveryConfig::default(),
            mdns: MdnsConfig::default(),
            gossipsub: GossipSubConfig::default(),
            query: QueryProtocolConfig::default(),
        }
    }
}

impl NetworkConfig {
    /// Load configuration from environment variables
    ///
    /// - NETWORK_PORT: Listen port (default: 0)
    /// - NETWORK_BOOTSTRAP: Comma-separated bootstrap peers
    /// - NETWORK_ENABLE_QUIC: (default: true)
    /// - NETWORK_EXTERNAL_ADDRESSES: Comma-separated publicly reachable addresses
    /// - NETWORK_RENDEZVOUS: (default: /p2p-rag/expertise)
    /// - NETWORK_DISCOVERY_INTERVAL_SECS: (default: 10)
    /// - MDNS_ENABLED: (default: true)
    /// - MDNS_QUERY_INTERVAL_SECS: (default: 30)
    pub fn from_env() -> Self {
        let discovery_defaults = DiscoveryConfig::default();

        let config = Self {
            enable_quic: env_bool("NETWORK_ENABLE_QUIC", true),
            listen_port: env_u16("NETWORK_PORT", 0),
            bootstrap_peers: env_multiaddrs("NETWORK_BOOTSTRAP"),
            external_addresses: env_multiaddrs("NETWORK_EXTERNAL_ADDRESSES"),
            discovery: DiscoveryConfig {
                rendezvous: env_string("NETWORK_RENDEZVOUS", &discovery_defaults.rendezvous),
                interval: env_duration_secs(
                    "NETWORK_DISCOVERY_INTERVAL_SECS",
                    discovery_defaults.interval.as_secs(),
                ),
            },
            mdns: MdnsConfig {
                enabled: env_bool("MDNS_ENABLED", true),
                query_interval_secs: env_u64("MDNS_QUERY_INTERVAL_SECS", 30),
            },
            gossipsub: GossipSubConfig::from_env(),
            query: QueryProtocolConfig::from_env(),
        };

        info!(
            enable_quic = config.enable_quic,
            listen_port = config.listen_port,
            bootstrap_peers = config.bootstrap_peers.len(),
            external_addresses = config.external_addresses.len(),
            rendezvous = %config.discovery.rendezvous,
            mdns = config.mdns.enabled,
            "Network configuration loaded"
        );

        config
    }

    /// TCP on an OS-assigned port without local discovery
    pub fn for_tests() -> Self {
        Self {
            enable_quic: false,
            mdns: MdnsConfig {
                enabled: false,
                ..MdnsConfig::default()
            },
            ..Self::default()
        }
    }
}

fn env_multiaddrs(key: &str) -> Vec<Multiaddr> {
    env_list(key)
        .into_iter()
        .filter_map(|addr| match addr.parse::<Multiaddr>() {
            Ok(addr) => Some(addr),
            Err(e) => {
                warn!(key, address = %addr, error = %e, "Ignoring invalid address");
                None
            }
        })
        .collect()
}
