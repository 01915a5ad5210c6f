use std::time::Duration;

use crate::modules::network::config::MdnsConfig;
use crate::modules::network::gossipsub::GossipSubConfig;
use crate::modules::network::query_protocol::{QueryCodec, QueryProtocol, QueryProtocolConfig};
use crate::modules::query::{QueryFrame, QueryResponse};
use libp2p::PeerId;
use libp2p::gossipsub;
use libp2p::identify;
use libp2p::identity::Keypair;
use libp2p::kad;
use libp2p::mdns;
use libp2p::request_response::{self, ProtocolSupport};
use libp2p::swarm::NetworkBehaviour;
use libp2p::swarm::behaviour::toggle::Toggle;
use tracing::{debug, info, warn};

pub const KADEMLIA_PROTOCOL: &str = "/p2p-rag/kad/1.0.0";

pub const IDENTIFY_PROTOCOL: &str = "/p2p-rag/id/1.0.0";

/// Combined network behaviour of an expertise node
///
/// - Kademlia DHT for peer routing and rendezvous provider records
/// - Identify to learn the listen addresses of connected peers
/// - mDNS for local network discovery
/// - GossipSub for expertise fan-out
/// - Request-Response for direct expertise queries
#[derive(NetworkBehaviour)]
#[behaviour(to_swarm = "ExpertiseBehaviourEvent")]
pub struct ExpertiseBehaviour {
    pub kademlia: kad::Behaviour<kad::store::MemoryStore>,

    pub identify: identify::Behaviour,

    pub mdns: Toggle<mdns::tokio::Behaviour>,

    pub gossipsub: Toggle<gossipsub::Behaviour>,

    pub query: request_response::Behaviour<QueryCodec>,
}

#[derive(Debug)]
pub enum ExpertiseBehaviourEvent {
    Kademlia(kad::Event),
    Identify(Box<identify::Event>),
    Mdns(mdns::Event),
    Gossipsub(gossipsub::Event),
    Query(request_response::Event<QueryFrame, QueryResponse>),
}

impl From<kad::Event> for ExpertiseBehaviourEvent {
    fn from(event: kad::Event) -> Self {
        ExpertiseBehaviourEvent::Kademlia(event)
    }
}

impl From<identify::Event> for ExpertiseBehaviourEvent {
    fn from(event: identify::Event) -> Self {
        ExpertiseBehaviourEvent::Identify(Box::new(event))
    }
}

impl From<mdns::Event> for ExpertiseBehaviourEvent {
    fn from(event: mdns::Event) -> Self {
        ExpertiseBehaviourEvent::Mdns(event)
    }
}

impl From<gossipsub::Event> for ExpertiseBehaviourEvent {
    fn from(event: gossipsub::Event) -> Self {
        ExpertiseBehaviourEvent::Gossipsub(event)
    }
}

impl From<request_response::Event<QueryFrame, QueryResponse>> for ExpertiseBehaviourEvent {
    fn from(event: request_response::Event<QueryFrame, QueryResponse>) -> Self {
        ExpertiseBehaviourEvent::Query(event)
    }
}

impl ExpertiseBehaviour {
    /// Create the behaviour
    ///
    /// # Arguments
    /// * `keypair` - The node's keypair (needed for GossipSub signing)
    /// * `mdns_config` - mDNS configuration (None to disable)
    /// * `gossipsub_config` - GossipSub configuration (None to disable)
    /// * `query_config` - Query protocol timeouts and size limits
    pub fn new(
        keypair: &Keypair,
        mdns_config: Option<&MdnsConfig>,
        gossipsub_config: Option<&GossipSubConfig>,
        query_config: &QueryProtocolConfig,
    ) -> Self {
        let local_peer_id = keypair.public().to_peer_id();
        Self {
            kademlia: Self::create_kademlia(local_peer_id),
            identify: Self::create_identify(keypair),
            mdns: Self::create_mdns(local_peer_id, mdns_config),
            gossipsub: Self::create_gossipsub(keypair, gossipsub_config),
            query: Self::create_query(query_config),
        }
    }

    fn create_kademlia(local_peer_id: PeerId) -> kad::Behaviour<kad::store::MemoryStore> {
        let config = kad::Config::new(libp2p::StreamProtocol::new(KADEMLIA_PROTOCOL));
        let store = kad::store::MemoryStore::new(local_peer_id);
        let mut kademlia = kad::Behaviour::with_config(local_peer_id, store, config);
        // Without a confirmed external address Kademlia would stay a client
        // and never answer provider lookups.
        kademlia.set_mode(Some(kad::Mode::Server));
        kademlia
    }

    fn create_identify(keypair: &Keypair) -> identify::Behaviour {
        identify::Behaviour::new(
            identify::Config::new(IDENTIFY_PROTOCOL.to_string(), keypair.public())
                .with_agent_version(format!("expertise-node/{}", env!("CARGO_PKG_VERSION"))),
        )
    }

    fn create_mdns(
        local_peer_id: PeerId,
        config: Option<&MdnsConfig>,
    ) -> Toggle<mdns::tokio::Behaviour> {
        let Some(config) = config.filter(|c| c.enabled) else {
            debug!("mDNS disabled");
            return Toggle::from(None);
        };

        match mdns::tokio::Behaviour::new(
            mdns::Config {
                ttl: Duration::from_secs(6 * 60),
                query_interval: Duration::from_secs(config.query_interval_secs),
                enable_ipv6: false,
            },
            local_peer_id,
        ) {
            Ok(behaviour) => {
                info!(
                    query_interval_secs = config.query_interval_secs,
                    "mDNS enabled for local network discovery"
                );
                Toggle::from(Some(behaviour))
            }
            Err(e) => {
                warn!("Failed to create mDNS behaviour: {}. Continuing without mDNS.", e);
                Toggle::from(None)
            }
        }
    }

    fn create_gossipsub(
        keypair: &Keypair,
        config: Option<&GossipSubConfig>,
    ) -> Toggle<gossipsub::Behaviour> {
        let Some(config) = config.filter(|c| c.enabled) else {
            debug!("GossipSub disabled");
            return Toggle::from(None);
        };

        match config.build_behaviour(keypair) {
            Ok(behaviour) => {
                info!(mesh_n = config.mesh_n, "GossipSub enabled (signed messages)");
                Toggle::from(Some(behaviour))
            }
            Err(e) => {
                warn!("{}. Continuing without GossipSub.", e);
                Toggle::from(None)
            }
        }
    }

    fn create_query(config: &QueryProtocolConfig) -> request_response::Behaviour<QueryCodec> {
        request_response::Behaviour::with_codec(
            QueryCodec::with_max_size(config.max_message_size),
            [(QueryProtocol::as_stream_protocol(), ProtocolSupport::Full)],
            request_response::Config::default().with_request_timeout(config.request_timeout),
        )
    }

    /// Add a bootstrap peer to the Kademlia routing table
    pub fn add_bootstrap_peer(&mut self, peer_id: PeerId, addr: libp2p::Multiaddr) {
        self.kademlia.add_address(&peer_id, addr);
    }

    /// Query the DHT to populate the routing table
    pub fn bootstrap(&mut self) -> Result<kad::QueryId, kad::NoKnownPeers> {
        self.kademlia.bootstrap()
    }

    /// Announce ourselves as a provider of `key`
    pub fn start_providing(&mut self, key: kad::RecordKey) -> Result<kad::QueryId, kad::store::Error> {
        self.kademlia.start_providing(key)
    }

    /// Look up the providers of `key`
    pub fn get_providers(&mut self, key: kad::RecordKey) -> kad::QueryId {
        self.kademlia.get_providers(key)
    }

    /// Number of peers in the Kademlia routing table
    pub fn known_peer_count(&mut self) -> usize {
        self.kademlia.kbuckets().map(|bucket| bucket.num_entries()).sum()
    }

    /// Subscribe to a GossipSub topic
    ///
    /// Returns false if GossipSub is disabled
    pub fn subscribe(
        &mut self,
        topic: &gossipsub::IdentTopic,
    ) -> Result<bool, gossipsub::SubscriptionError> {
        if let Some(gs) = self.gossipsub.as_mut() {
            gs.subscribe(topic)?;
            info!(topic = %topic, "Subscribed to topic");
            Ok(true)
        } else {
            warn!("Cannot subscribe: GossipSub is disabled");
            Ok(false)
        }
    }

    /// Publish bytes to a GossipSub topic
    pub fn publish(
        &mut self,
        topic: gossipsub::IdentTopic,
        data: Vec<u8>,
    ) -> Result<gossipsub::MessageId, gossipsub::PublishError> {
        if let Some(gs) = self.gossipsub.as_mut() {
            let msg_id = gs.publish(topic.clone(), data)?;
            debug!(topic = %topic, message_id = %msg_id, "Published message");
            Ok(msg_id)
        } else {
            Err(gossipsub::PublishError::NoPeersSubscribedToTopic)
        }
    }

    pub fn is_subscribed(&self, topic: &gossipsub::IdentTopic) -> bool {
        self.gossipsub
            .as_ref()
            .is_some_and(|gs| gs.topics().any(|t| *t == topic.hash()))
    }

    pub fn is_gossipsub_enabled(&self) -> bool {
        self.gossipsub.is_enabled()
    }
}
