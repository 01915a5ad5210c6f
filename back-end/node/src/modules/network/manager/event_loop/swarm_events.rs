//! Swarm event handling - connections, errors, dispatching

use super::NetworkEventLoop;
use crate::modules::network::behaviour::ExpertiseBehaviourEvent;
use libp2p::swarm::SwarmEvent;
use tracing::{debug, info, warn};

impl NetworkEventLoop {
    pub(crate) async fn handle_swarm_event(&mut self, event: SwarmEvent<ExpertiseBehaviourEvent>) {
        match event {
            SwarmEvent::NewListenAddr { address, .. } => {
                info!(
                    "Listening on: {}/p2p/{}",
                    address,
                    self.swarm.local_peer_id()
                );
            }

            SwarmEvent::ConnectionEstablished {
                peer_id,
                endpoint,
                num_established,
                established_in,
                ..
            } => {
                info!(
                    peer_id = %peer_id,
                    address = %endpoint.get_remote_address(),
                    dialer = endpoint.is_dialer(),
                    connections = num_established.get(),
                    "Connection established in {:?}",
                    established_in
                );
                self.dialing_peers.remove(&peer_id);
            }

            SwarmEvent::ConnectionClosed {
                peer_id,
                cause,
                num_established,
                ..
            } => {
                debug!(
                    peer_id = %peer_id,
                    cause = ?cause,
                    remaining = num_established,
                    "Connection closed"
                );
                self.dialing_peers.remove(&peer_id);
            }

            SwarmEvent::IncomingConnectionError {
                send_back_addr,
                error,
                ..
            } => {
                warn!("Incoming connection error from {}: {}", send_back_addr, error);
            }

            SwarmEvent::OutgoingConnectionError { peer_id, error, .. } => {
                warn!("Outgoing connection error to {:?}: {}", peer_id, error);
                if let Some(peer) = peer_id.as_ref() {
                    self.dialing_peers.remove(peer);
                }
            }

            SwarmEvent::Behaviour(ExpertiseBehaviourEvent::Kademlia(event)) => {
                self.handle_kad_event(event);
            }

            SwarmEvent::Behaviour(ExpertiseBehaviourEvent::Identify(event)) => {
                self.handle_identify_event(*event);
            }

            SwarmEvent::Behaviour(ExpertiseBehaviourEvent::Mdns(event)) => {
                self.handle_mdns_event(event);
            }

            SwarmEvent::Behaviour(ExpertiseBehaviourEvent::Gossipsub(event)) => {
                self.handle_gossipsub_event(event).await;
            }

            SwarmEvent::Behaviour(ExpertiseBehaviourEvent::Query(event)) => {
                self.handle_query_event(event);
            }

            event => {
                debug!("Unhandled swarm event: {:?}", event);
            }
        }
    }
}
