use crate::bootstrap::config::Config;
use crate::modules::expertise::{Expertise, ExpertiseStore};
use crate::modules::gossip::{GossipError, GossipPublisher, SwarmTopic};
use crate::modules::network::manager::NetworkManager;
use crate::modules::query::{HttpLocalSearch, LocalSearch, QueryError, QueryRequest, QueryRouter};
use errors::AppError;
use libp2p::identity::Keypair;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct Node {
    pub store: Arc<ExpertiseStore>,
    pub publisher: Arc<GossipPublisher>,
    pub router: QueryRouter,
    pub network_manager: Arc<NetworkManager>,
}

impl Node {
    pub fn new(
        store: Arc<ExpertiseStore>,
        publisher: Arc<GossipPublisher>,
        router: QueryRouter,
        network_manager: Arc<NetworkManager>,
    ) -> Self {
        Node {
            store,
            publisher,
            router,
            network_manager,
        }
    }

    /// Wire the production collaborators: HTTP local search, the libp2p
    /// host and the configured gossip topic.
    pub fn assemble(keypair: Keypair, config: &Config) -> Result<Self, AppError> {
        let local_search: Arc<dyn LocalSearch> = Arc::new(
            HttpLocalSearch::new(&config.local_search.url, config.local_search.timeout)
                .map_err(|e| AppError::Config(format!("Failed to build local search client: {}", e)))?,
        );

        let network_manager = Arc::new(NetworkManager::new(keypair, Arc::clone(&local_search)));

        let store = Arc::new(ExpertiseStore::new());
        let channel = Arc::new(SwarmTopic::new(
            Arc::clone(&network_manager),
            config.gossip.topic.clone(),
        ));
        let publisher = Arc::new(GossipPublisher::new(Arc::clone(&store), channel));
        let router = QueryRouter::new(network_manager.clone(), local_search);

        Ok(Node::new(store, publisher, router, network_manager))
    }

    pub fn peer_id(&self) -> String {
        self.network_manager.local_peer_id().to_string()
    }

    pub async fn is_network_running(&self) -> bool {
        self.network_manager.is_running().await
    }

    /// Store the record, then gossip it once.
    ///
    /// The record stays stored even when the broadcast fails.
    pub async fn ingest(&self, expertise: Expertise) -> Result<(), GossipError> {
        info!(embeddings = expertise.len(), "Ingesting expertise");

        self.store.append(expertise.clone()).await;
        self.publisher.publish_one(&expertise).await
    }

    pub async fn expertise(&self) -> Vec<Expertise> {
        self.store.snapshot().await
    }

    pub async fn query(&self, request: QueryRequest, target: &str) -> Result<Value, QueryError> {
        self.router.route(request, target).await
    }
}
