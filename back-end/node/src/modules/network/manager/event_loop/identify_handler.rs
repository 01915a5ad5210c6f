//! Identify event handler - feeds peer listen addresses into Kademlia

use super::NetworkEventLoop;
use crate::modules::network::behaviour::KADEMLIA_PROTOCOL;
use libp2p::identify;
use tracing::debug;

impl NetworkEventLoop {
    pub(crate) fn handle_identify_event(&mut self, event: identify::Event) {
        match event {
            identify::Event::Received { peer_id, info, .. } => {
                let speaks_kad = info
                    .protocols
                    .iter()
                    .any(|protocol| protocol.as_ref() == KADEMLIA_PROTOCOL);

                if !speaks_kad {
                    debug!(%peer_id, agent = %info.agent_version, "Peer does not speak our DHT protocol");
                    return;
                }

                debug!(
                    %peer_id,
                    agent = %info.agent_version,
                    addresses = info.listen_addrs.len(),
                    "Identified peer"
                );
                for addr in info.listen_addrs {
                    self.swarm.behaviour_mut().kademlia.add_address(&peer_id, addr);
                }
            }

            identify::Event::Error { peer_id, error, .. } => {
                debug!(%peer_id, error = ?error, "Identify failed");
            }

            _ => {}
        }
    }
}
