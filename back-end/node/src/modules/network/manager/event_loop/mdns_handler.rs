//! mDNS event handler - local peer discovery and auto-dialing

use super::NetworkEventLoop;
use libp2p::mdns;
use tracing::{debug, info};

impl NetworkEventLoop {
    pub(crate) fn handle_mdns_event(&mut self, event: mdns::Event) {
        match event {
            mdns::Event::Discovered(list) => {
                for (peer_id, multiaddr) in list {
                    info!(source = "mdns", %peer_id, %multiaddr, "Peer discovered");

                    self.swarm
                        .behaviour_mut()
                        .kademlia
                        .add_address(&peer_id, multiaddr.clone());

                    if !self.dial_if_allowed(peer_id, Some(multiaddr), "mdns") {
                        debug!(
                            "Skipping dial to {} (already connected or recently attempted)",
                            peer_id
                        );
                    }
                }
            }

            mdns::Event::Expired(list) => {
                for (peer_id, multiaddr) in list {
                    // Connections time out on their own if the peer is really gone
                    debug!("mDNS peer expired: {} at {}", peer_id, multiaddr);
                }
            }
        }
    }
}
