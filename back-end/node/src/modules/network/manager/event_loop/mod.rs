//! Network event loop - processes swarm events and commands

mod bootstrap;
mod command_handler;
mod discovery_handler;
mod gossipsub_handler;
mod identify_handler;
mod kademlia_handler;
mod mdns_handler;
mod query_handler;
mod swarm_events;

use crate::modules::network::behaviour::ExpertiseBehaviour;
use crate::modules::network::gossipsub::TopicSubscriptionManager;
use crate::modules::network::manager::commands::NetworkCommand;
use crate::modules::query::{LocalSearch, QueryError, QueryResponse};
use futures::StreamExt;
use libp2p::kad::RecordKey;
use libp2p::request_response::{OutboundRequestId, ResponseChannel};
use libp2p::swarm::dial_opts::DialOpts;
use libp2p::{Multiaddr, PeerId, Swarm};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant as StdInstant};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

/// Delay before the first bootstrap so listeners are up
const BOOTSTRAP_DELAY: Duration = Duration::from_millis(500);

/// Interval for re-dialing disconnected bootstrap peers
const BOOTSTRAP_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Minimum time between dials to the same peer
const MIN_REDIAL_INTERVAL: Duration = Duration::from_secs(30);

/// Floor for the rendezvous lookup interval
const MIN_DISCOVERY_INTERVAL: Duration = Duration::from_millis(100);

/// Answer to an inbound query, produced off-loop and framed by the loop
pub(crate) type QueryReply = (ResponseChannel<QueryResponse>, QueryResponse);

/// Internal event loop handling Swarm events
pub struct NetworkEventLoop {
    /// The libp2p Swarm. Only this task touches it.
    pub swarm: Swarm<ExpertiseBehaviour>,

    /// Commands from the NetworkManager API
    pub command_rx: mpsc::UnboundedReceiver<NetworkCommand>,

    /// Delivers received GossipSub messages to local subscribers
    pub subscription_manager: Arc<TopicSubscriptionManager>,

    /// Serves inbound queries
    pub local_search: Arc<dyn LocalSearch>,

    /// Outbound queries awaiting a response, keyed by request
    pub pending_queries: HashMap<OutboundRequestId, oneshot::Sender<Result<Value, QueryError>>>,

    /// Finished inbound query answers waiting to be written
    pub query_reply_tx: mpsc::UnboundedSender<QueryReply>,
    pub query_reply_rx: mpsc::UnboundedReceiver<QueryReply>,

    /// Configured bootstrap peers
    pub bootstrap_peers: Vec<(PeerId, Multiaddr)>,

    /// Whether initial bootstrap has been triggered
    pub bootstrap_initiated: bool,

    /// DHT key announced and looked up to find the rest of the swarm
    pub rendezvous: RecordKey,

    pub discovery_interval: Duration,

    /// When the rendezvous provider record was last announced
    pub last_announce: Option<StdInstant>,

    /// Peers we're currently dialing
    pub dialing_peers: HashSet<PeerId>,

    /// When we last attempted to dial each peer (for rate limiting)
    pub last_dial_attempt: HashMap<PeerId, StdInstant>,
}

impl NetworkEventLoop {
    pub(crate) fn new(
        swarm: Swarm<ExpertiseBehaviour>,
        command_rx: mpsc::UnboundedReceiver<NetworkCommand>,
        subscription_manager: Arc<TopicSubscriptionManager>,
        local_search: Arc<dyn LocalSearch>,
        bootstrap_peers: Vec<(PeerId, Multiaddr)>,
        rendezvous: RecordKey,
        discovery_interval: Duration,
    ) -> Self {
        let (query_reply_tx, query_reply_rx) = mpsc::unbounded_channel();
        Self {
            swarm,
            command_rx,
            subscription_manager,
            local_search,
            pending_queries: HashMap::new(),
            query_reply_tx,
            query_reply_rx,
            bootstrap_peers,
            bootstrap_initiated: false,
            rendezvous,
            discovery_interval: discovery_interval.max(MIN_DISCOVERY_INTERVAL),
            last_announce: None,
            dialing_peers: HashSet::new(),
            last_dial_attempt: HashMap::new(),
        }
    }

    pub async fn run(&mut self) {
        info!("Network event loop started");

        self.run_event_loop().await;
        self.shutdown();

        info!("Network event loop stopped");
    }

    async fn run_event_loop(&mut self) {
        let bootstrap_delay = tokio::time::sleep(BOOTSTRAP_DELAY);
        tokio::pin!(bootstrap_delay);

        let mut retry_interval = tokio::time::interval(BOOTSTRAP_RETRY_INTERVAL);
        retry_interval.tick().await;

        let mut discovery_interval = tokio::time::interval(self.discovery_interval);
        discovery_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        discovery_interval.tick().await;

        loop {
            tokio::select! {
                _ = &mut bootstrap_delay, if !self.bootstrap_initiated => {
                    self.execute_bootstrap();
                }

                _ = retry_interval.tick(), if self.should_retry_bootstrap() => {
                    self.retry_bootstrap_peers();
                }

                _ = discovery_interval.tick(), if self.bootstrap_initiated => {
                    self.run_discovery_round();
                }

                event = self.swarm.select_next_some() => {
                    self.handle_swarm_event(event).await;
                }

                Some((channel, response)) = self.query_reply_rx.recv() => {
                    self.send_query_response(channel, response);
                }

                command = self.command_rx.recv() => match command {
                    Some(command) => {
                        if self.handle_command(command).await {
                            break;
                        }
                    }
                    None => {
                        info!("Command channel closed");
                        break;
                    }
                }
            }
        }
    }

    fn should_retry_bootstrap(&self) -> bool {
        self.bootstrap_initiated && !self.bootstrap_peers.is_empty()
    }

    /// Fail every outbound query still waiting on the swarm
    fn shutdown(&mut self) {
        for (_, pending) in self.pending_queries.drain() {
            let _ = pending.send(Err(QueryError::Transport(
                "network shut down".to_string(),
            )));
        }
    }

    /// Determine if we should dial a discovered peer
    ///
    /// Skips ourselves, connected peers, in-flight dials and recent attempts.
    fn should_dial_peer(&self, peer_id: &PeerId) -> bool {
        if peer_id == self.swarm.local_peer_id() {
            return false;
        }

        if self.swarm.is_connected(peer_id) || self.dialing_peers.contains(peer_id) {
            return false;
        }

        self.last_dial_attempt
            .get(peer_id)
            .is_none_or(|last| last.elapsed() >= MIN_REDIAL_INTERVAL)
    }

    /// Dial `peer_id` if it passes the dial guard
    ///
    /// Without an address the behaviours (Kademlia routing table and running
    /// queries) supply the candidates.
    fn dial_if_allowed(&mut self, peer_id: PeerId, addr: Option<Multiaddr>, source: &str) -> bool {
        if !self.should_dial_peer(&peer_id) {
            return false;
        }

        let opts = match &addr {
            Some(addr) => DialOpts::peer_id(peer_id).addresses(vec![addr.clone()]).build(),
            None => DialOpts::peer_id(peer_id).build(),
        };

        self.last_dial_attempt.insert(peer_id, StdInstant::now());
        match self.swarm.dial(opts) {
            Ok(()) => {
                info!(source, peer_id = %peer_id, address = ?addr, "Dialing peer");
                self.dialing_peers.insert(peer_id);
                true
            }
            Err(e) => {
                warn!(source, peer_id = %peer_id, error = %e, "Failed to dial peer");
                false
            }
        }
    }
}
