use async_trait::async_trait;
use axum::Router;
use libp2p::identity::Keypair;
use libp2p::multiaddr::Protocol;
use libp2p::{Multiaddr, PeerId};
use node::api::node::Node;
use node::api::servers::app_state::AppState;
use node::api::servers::rest;
use node::bootstrap::config::{
    ClientApiConfig, Config, CorsConfig, DEFAULT_GOSSIP_TOPIC, GossipConfig, LocalSearchConfig,
    ServerConfig,
};
use node::modules::expertise::ExpertiseStore;
use node::modules::gossip::{BroadcastChannel, GossipError, GossipPublisher};
use node::modules::network::config::{DiscoveryConfig, NetworkConfig};
use node::modules::network::gossipsub::GossipSubConfig;
use node::modules::network::manager::NetworkManager;
use node::modules::query::{
    LocalSearch, PeerHost, QueryError, QueryRequest, QueryRouter, SearchError,
};
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

pub fn set_env(key: &str, value: &str) {
    unsafe {
        std::env::set_var(key, value);
    }
}

pub fn set_envs(envs: &Vec<(&str, &str)>) {
    for env in envs {
        unsafe {
            std::env::set_var(env.0, env.1);
        }
    }
}

pub fn remove_env(key: &str) {
    unsafe {
        std::env::remove_var(key);
    }
}

/// Remove multiple environment variables
pub fn remove_envs(keys: &[&str]) {
    for key in keys {
        unsafe {
            std::env::remove_var(key);
        }
    }
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

// ============================================================================
// Fakes
// ============================================================================

/// How the fake broadcast channel answers publishes.
#[derive(Debug, Clone, Copy, Default)]
pub enum ChannelBehaviour {
    #[default]
    Accept,
    NotJoined,
    NoPeers,
    Reject,
}

/// Broadcast channel recording every accepted payload.
#[derive(Default)]
pub struct RecordingChannel {
    pub behaviour: ChannelBehaviour,
    pub sent: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl BroadcastChannel for RecordingChannel {
    async fn publish(&self, payload: Vec<u8>) -> Result<(), GossipError> {
        match self.behaviour {
            ChannelBehaviour::Accept => {
                self.sent.lock().await.push(payload);
                Ok(())
            }
            ChannelBehaviour::NotJoined => Err(GossipError::NotJoined {
                message: "network not started".to_string(),
            }),
            ChannelBehaviour::NoPeers => Err(GossipError::NoPeers {
                topic: DEFAULT_GOSSIP_TOPIC.to_string(),
            }),
            ChannelBehaviour::Reject => Err(GossipError::Channel {
                message: "message too large".to_string(),
            }),
        }
    }
}

/// Peer host with a fixed identity and connection set.
pub struct FakePeerHost {
    pub id: Option<PeerId>,
    pub connected: Vec<PeerId>,
    pub sends: AtomicUsize,
}

impl FakePeerHost {
    pub fn new(id: Option<PeerId>, connected: Vec<PeerId>) -> Self {
        Self {
            id,
            connected,
            sends: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PeerHost for FakePeerHost {
    async fn local_peer_id(&self) -> Option<PeerId> {
        self.id
    }

    async fn is_connected(&self, peer: &PeerId) -> Result<bool, QueryError> {
        Ok(self.connected.contains(peer))
    }

    async fn send_query(&self, peer: PeerId, request: QueryRequest) -> Result<Value, QueryError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"answeredBy": peer.to_string(), "queryId": request.query_id}))
    }
}

/// Local search returning a canned result, or a 502 when `fail` is set.
pub struct StaticSearch {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StaticSearch {
    pub fn new(fail: bool) -> Self {
        Self {
            fail,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LocalSearch for StaticSearch {
    async fn search(&self, request: &QueryRequest) -> Result<Value, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SearchError::Status { status: 502 });
        }
        Ok(json!({"queryId": request.query_id, "matches": [{"key": "doc-1", "score": 0.9}]}))
    }
}

pub fn random_peer_id() -> PeerId {
    Keypair::generate_ed25519().public().to_peer_id()
}

// ============================================================================
// Test server
// ============================================================================

/// Test server container with access to all components
pub struct TestServer {
    pub router: Router,
    pub node: Node,
    pub local_peer_id: PeerId,
    pub channel: Arc<RecordingChannel>,
    pub host: Arc<FakePeerHost>,
    pub search: Arc<StaticSearch>,
}

#[derive(Debug, Clone, Default)]
pub struct TestServerOptions {
    pub host_not_ready: bool,
    pub connected_peers: Vec<PeerId>,
    pub channel: ChannelBehaviour,
    pub search_fails: bool,
}

pub fn create_test_config() -> Config {
    Config {
        server: ServerConfig { rest_port: 8888 },
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allow_credentials: false,
        },
        local_search: LocalSearchConfig {
            url: "http://localhost:9999".to_string(),
            timeout: Duration::from_secs(10),
        },
        client_api: ClientApiConfig {
            url: None,
            queue: Default::default(),
        },
        gossip: GossipConfig {
            topic: DEFAULT_GOSSIP_TOPIC.to_string(),
            republish_interval: Duration::from_secs(10),
        },
        node_private_key: None,
    }
}

/// Setup a test server with app state
pub async fn setup_test_server() -> TestServer {
    setup_test_server_with(TestServerOptions::default()).await
}

pub async fn setup_test_server_with(options: TestServerOptions) -> TestServer {
    let keypair = Keypair::generate_ed25519();
    let local_peer_id = keypair.public().to_peer_id();

    let search = Arc::new(StaticSearch::new(options.search_fails));
    let host = Arc::new(FakePeerHost::new(
        (!options.host_not_ready).then_some(local_peer_id),
        options.connected_peers,
    ));
    let channel = Arc::new(RecordingChannel {
        behaviour: options.channel,
        ..Default::default()
    });

    let store = Arc::new(ExpertiseStore::new());
    let publisher = Arc::new(GossipPublisher::new(Arc::clone(&store), channel.clone()));
    let router = QueryRouter::new(host.clone(), search.clone());
    let network_manager = Arc::new(NetworkManager::new(keypair, search.clone()));

    let node = Node::new(store, publisher, router, network_manager);
    let app_state = AppState::new(node.clone());
    let router = rest::build_router(app_state, &create_test_config());

    TestServer {
        router,
        node,
        local_peer_id,
        channel,
        host,
        search,
    }
}

// ============================================================================
// Two-Node Network Test Infrastructure
// ============================================================================

/// TCP on loopback, no mDNS, fast heartbeats and rendezvous lookups
pub fn create_network_config() -> NetworkConfig {
    NetworkConfig {
        gossipsub: GossipSubConfig {
            heartbeat_interval: Duration::from_millis(200),
            ..Default::default()
        },
        discovery: DiscoveryConfig {
            interval: Duration::from_millis(300),
            ..Default::default()
        },
        ..NetworkConfig::for_tests()
    }
}

/// Loopback address of a started manager, with its `/p2p/` suffix
pub async fn loopback_addr(manager: &NetworkManager) -> Multiaddr {
    for _ in 0..50 {
        let loopback = manager
            .listen_addrs()
            .await
            .unwrap()
            .into_iter()
            .find(|addr| addr.to_string().starts_with("/ip4/127.0.0.1/"));

        if let Some(addr) = loopback {
            return addr.with(Protocol::P2p(*manager.local_peer_id()));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("manager never reported a loopback listen address");
}

pub struct TwoNodeTestContext {
    pub first: Arc<NetworkManager>,
    pub second: Arc<NetworkManager>,
}

/// Start two managers and connect `first` to `second`.
pub async fn setup_two_node_network(
    first_search: Arc<dyn LocalSearch>,
    second_search: Arc<dyn LocalSearch>,
) -> TwoNodeTestContext {
    let config = create_network_config();

    let first = Arc::new(NetworkManager::new(Keypair::generate_ed25519(), first_search));
    let second = Arc::new(NetworkManager::new(Keypair::generate_ed25519(), second_search));

    first.start(&config).await.expect("Failed to start first node");
    second.start(&config).await.expect("Failed to start second node");

    let second_addr = loopback_addr(&second).await;
    info!("Dialing second node at {}", second_addr);
    first.dial_peer(second_addr).await.expect("Dial failed");

    let second_id = *second.local_peer_id();
    let connected = eventually(Duration::from_secs(10), || {
        let first = Arc::clone(&first);
        async move { first.connected_peers().await.unwrap().contains(&second_id) }
    })
    .await;
    assert!(connected, "Nodes never connected");

    TwoNodeTestContext { first, second }
}

pub async fn cleanup_two_node_network(ctx: TwoNodeTestContext) {
    let _ = ctx.first.stop().await;
    let _ = ctx.second.stop().await;
}
