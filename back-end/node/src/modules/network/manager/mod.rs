//! Network Manager - High-level P2P networking interface
//!
//! Provides thread-safe access to libp2p networking operations.

mod commands;
mod event_loop;

use crate::modules::gossip::GossipError;
use crate::modules::network::behaviour::ExpertiseBehaviour;
use crate::modules::network::config::NetworkConfig;
use crate::modules::network::gossipsub::{SubscriptionHandle, TopicSubscriptionManager};
use crate::modules::query::{LocalSearch, PeerHost, QueryError, QueryRequest};
use async_trait::async_trait;
use commands::NetworkCommand;
use errors::AppError;
use event_loop::NetworkEventLoop;
use libp2p::identity::Keypair;
use libp2p::multiaddr::Protocol;
use libp2p::{Multiaddr, PeerId, Swarm, kad, noise, tcp, yamux};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

/// High-level network manager providing thread-safe access to P2P networking
pub struct NetworkManager {
    local_peer_id: PeerId,

    /// Kept to build the swarm in start()
    keypair: Keypair,

    /// Channel for sending commands to the event loop
    command_tx: mpsc::UnboundedSender<NetworkCommand>,

    /// Command receiver - taken once during start() and moved to the event loop.
    command_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<NetworkCommand>>>>,

    /// Handle to the background event loop task
    event_loop_handle: Arc<Mutex<Option<JoinHandle<()>>>>,

    /// Fan-out of received GossipSub messages to local subscribers
    subscription_manager: Arc<TopicSubscriptionManager>,

    /// Serves inbound queries
    local_search: Arc<dyn LocalSearch>,
}

impl std::fmt::Debug for NetworkManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkManager")
            .field("local_peer_id", &self.local_peer_id)
            .finish_non_exhaustive()
    }
}

impl NetworkManager {
    /// Create a new NetworkManager from the node identity
    ///
    /// This does NOT start the swarm. Call `start()` to begin networking.
    pub fn new(keypair: Keypair, local_search: Arc<dyn LocalSearch>) -> Self {
        let local_peer_id = keypair.public().to_peer_id();
        info!(peer_id = %local_peer_id, "Network PeerId initialized");

        let (command_tx, command_rx) = mpsc::unbounded_channel();

        Self {
            local_peer_id,
            keypair,
            command_tx,
            command_rx: Arc::new(Mutex::new(Some(command_rx))),
            event_loop_handle: Arc::new(Mutex::new(None)),
            subscription_manager: Arc::new(TopicSubscriptionManager::default()),
            local_search,
        }
    }

    /// Build the libp2p Swarm with transport and behaviour
    fn build_swarm(
        keypair: Keypair,
        config: &NetworkConfig,
    ) -> Result<Swarm<ExpertiseBehaviour>, AppError> {
        info!("Building libp2p Swarm");

        let mut behaviour = ExpertiseBehaviour::new(
            &keypair,
            Some(&config.mdns),
            Some(&config.gossipsub),
            &config.query,
        );

        for (peer_id, addr) in Self::parse_bootstrap_peers(&config.bootstrap_peers) {
            info!("Adding bootstrap peer: {} at {}", peer_id, addr);
            behaviour.add_bootstrap_peer(peer_id, addr);
        }

        let mut swarm = libp2p::SwarmBuilder::with_existing_identity(keypair)
            .with_tokio()
            .with_tcp(
                tcp::Config::default(),
                noise::Config::new,
                yamux::Config::default,
            )
            .map_err(|e| AppError::Network(format!("Failed to build TCP transport: {}", e)))?
            .with_quic()
            .with_behaviour(|_| behaviour)
            .map_err(|e| AppError::Network(format!("Failed to build behaviour: {}", e)))?
            .with_swarm_config(|cfg| cfg.with_idle_connection_timeout(Duration::from_secs(60)))
            .build();

        for addr in &config.external_addresses {
            info!(address = %addr, "Adding external address");
            swarm.add_external_address(addr.clone());
        }

        info!("Swarm built successfully (mDNS: {})", config.mdns.enabled);

        Ok(swarm)
    }

    /// Start the network manager
    ///
    /// Spawns the event loop task and begins listening on the configured
    /// port. The event loop runs until `stop()` is called.
    ///
    /// # Errors
    /// Returns `AppError::Network` if already started or listen fails
    pub async fn start(&self, config: &NetworkConfig) -> Result<(), AppError> {
        self.ensure_not_started().await?;

        info!("Starting NetworkManager event loop");

        let listen_addr = Self::resolve_listen_address(config)?;
        let swarm = Self::build_swarm(self.keypair.clone(), config)?;
        let command_rx = self.take_command_receiver().await?;
        let bootstrap_peers = Self::parse_bootstrap_peers(&config.bootstrap_peers);

        let event_loop = NetworkEventLoop::new(
            swarm,
            command_rx,
            Arc::clone(&self.subscription_manager),
            Arc::clone(&self.local_search),
            bootstrap_peers,
            kad::RecordKey::new(&config.discovery.rendezvous),
            config.discovery.interval,
        );

        let handle = Self::spawn_event_loop(event_loop, listen_addr)?;
        *self.event_loop_handle.lock().await = Some(handle);

        Ok(())
    }

    async fn ensure_not_started(&self) -> Result<(), AppError> {
        if self.event_loop_handle.lock().await.is_some() {
            return Err(AppError::Network(
                "NetworkManager already started".to_string(),
            ));
        }
        Ok(())
    }

    fn resolve_listen_address(config: &NetworkConfig) -> Result<Multiaddr, AppError> {
        let listen_addr = if config.enable_quic {
            format!("/ip4/0.0.0.0/udp/{}/quic-v1", config.listen_port)
        } else {
            format!("/ip4/0.0.0.0/tcp/{}", config.listen_port)
        };

        listen_addr
            .parse()
            .map_err(|e| AppError::Network(format!("Invalid listen address: {}", e)))
    }

    async fn take_command_receiver(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<NetworkCommand>, AppError> {
        self.command_rx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::Network("Network already started".to_string()))
    }

    /// Split bootstrap addresses into (peer, address) pairs
    fn parse_bootstrap_peers(addrs: &[Multiaddr]) -> Vec<(PeerId, Multiaddr)> {
        addrs
            .iter()
            .filter_map(|addr| {
                let peer_id = addr.iter().find_map(|p| match p {
                    Protocol::P2p(id) => Some(id),
                    _ => None,
                });
                if peer_id.is_none() {
                    warn!(address = %addr, "Bootstrap address missing /p2p/ component, skipping");
                }
                peer_id.map(|id| (id, addr.clone()))
            })
            .collect()
    }

    fn spawn_event_loop(
        mut event_loop: NetworkEventLoop,
        listen_addr: Multiaddr,
    ) -> Result<JoinHandle<()>, AppError> {
        event_loop.swarm.listen_on(listen_addr.clone()).map_err(|e| {
            error!(error = ?e, "Listen failed");
            AppError::Network(format!("Failed to listen: {:?}", e))
        })?;

        info!("Listening on: {}", listen_addr);

        Ok(tokio::spawn(async move {
            event_loop.run().await;
        }))
    }

    /// Stop the network manager
    ///
    /// Sends shutdown command and waits for event loop to terminate
    pub async fn stop(&self) -> Result<(), AppError> {
        info!("Stopping NetworkManager");

        let mut handle_guard = self.event_loop_handle.lock().await;

        if handle_guard.is_none() {
            info!("NetworkManager was never started, nothing to stop");
            return Ok(());
        }

        if self.command_tx.send(NetworkCommand::Shutdown).is_err() {
            warn!("Event loop already stopped");
            *handle_guard = None;
            return Ok(());
        }

        if let Some(handle) = handle_guard.take() {
            handle
                .await
                .map_err(|e| AppError::Network(format!("Event loop panic: {}", e)))?;
        }

        info!("NetworkManager stopped");
        Ok(())
    }

    pub fn local_peer_id(&self) -> &PeerId {
        &self.local_peer_id
    }

    pub async fn is_running(&self) -> bool {
        self.event_loop_handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn ensure_started(&self) -> Result<(), AppError> {
        if self.event_loop_handle.lock().await.is_none() {
            return Err(AppError::Network(
                "NetworkManager not started - call start() first".to_string(),
            ));
        }
        Ok(())
    }

    /// Send a command and await its response.
    async fn send_command<T, F>(&self, make_command: F, action: &str) -> Result<T, AppError>
    where
        F: FnOnce(oneshot::Sender<T>) -> NetworkCommand,
    {
        self.ensure_started().await?;
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(make_command(tx))
            .map_err(|_| AppError::Network(format!("Failed to send {} command", action)))?;
        rx.await
            .map_err(|_| AppError::Network(format!("Failed to receive {} response", action)))
    }

    /// Like send_command, for commands the event loop can fail with a String error.
    async fn send_fallible_command<T, F>(&self, make_command: F, action: &str) -> Result<T, AppError>
    where
        F: FnOnce(oneshot::Sender<Result<T, String>>) -> NetworkCommand,
    {
        self.send_command(make_command, action)
            .await?
            .map_err(AppError::Network)
    }

    /// Join a topic and open a local handle for the messages received on it
    #[instrument(skip(self, topic))]
    pub async fn subscribe(&self, topic: impl Into<String>) -> Result<SubscriptionHandle, AppError> {
        let topic = topic.into();

        self.send_fallible_command(
            |tx| NetworkCommand::Subscribe {
                topic: topic.clone(),
                response: tx,
            },
            "subscribe",
        )
        .await?;

        let handle = self.subscription_manager.subscribe(topic.as_str()).await;
        info!(topic = %topic, "Subscribed to topic with message channel");

        Ok(handle)
    }

    /// Publish bytes to a joined topic
    ///
    /// Fails with `NotJoined` while the network is stopped or the topic was
    /// never joined, and with `NoPeers` when nobody is listening yet.
    pub async fn publish(&self, topic: &str, data: Vec<u8>) -> Result<(), GossipError> {
        let command = |tx| NetworkCommand::Publish {
            topic: topic.to_string(),
            data,
            response: tx,
        };

        self.send_command(command, "publish")
            .await
            .map_err(|e| GossipError::NotJoined {
                message: e.to_string(),
            })?
    }

    pub async fn dial_peer(&self, address: Multiaddr) -> Result<(), AppError> {
        self.send_fallible_command(
            |tx| NetworkCommand::DialPeer {
                address,
                response: tx,
            },
            "dial peer",
        )
        .await
    }

    pub async fn connected_peers(&self) -> Result<Vec<PeerId>, AppError> {
        self.send_command(NetworkCommand::GetConnectedPeers, "get connected peers")
            .await
    }

    pub async fn listen_addrs(&self) -> Result<Vec<Multiaddr>, AppError> {
        self.send_command(NetworkCommand::GetListenAddrs, "get listen addresses")
            .await
    }
}

#[async_trait]
impl PeerHost for NetworkManager {
    async fn local_peer_id(&self) -> Option<PeerId> {
        self.is_running().await.then_some(self.local_peer_id)
    }

    async fn is_connected(&self, peer: &PeerId) -> Result<bool, QueryError> {
        let peer_id = *peer;
        self.send_command(
            |tx| NetworkCommand::IsConnected {
                peer_id,
                response: tx,
            },
            "is connected",
        )
        .await
        .map_err(|e| QueryError::Transport(e.to_string()))
    }

    #[instrument(skip(self, request), fields(peer = %peer, query_id = %request.query_id))]
    async fn send_query(&self, peer: PeerId, request: QueryRequest) -> Result<Value, QueryError> {
        self.send_command(
            |tx| NetworkCommand::SendQuery {
                peer_id: peer,
                request,
                response: tx,
            },
            "send query",
        )
        .await
        .map_err(|e| QueryError::Transport(e.to_string()))?
    }
}
