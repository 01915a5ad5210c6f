//! Bootstrap logic for network initialization

use super::NetworkEventLoop;
use tracing::{info, warn};

impl NetworkEventLoop {
    /// Dial the configured bootstrap peers and start a Kademlia bootstrap
    pub(crate) fn execute_bootstrap(&mut self) {
        if self.bootstrap_initiated {
            return;
        }
        self.bootstrap_initiated = true;

        if self.bootstrap_peers.is_empty() {
            info!("No bootstrap peers configured, relying on local discovery");
            return;
        }

        info!(peer_count = self.bootstrap_peers.len(), "Executing bootstrap");

        let dialed = self.dial_bootstrap_peers();

        match self.swarm.behaviour_mut().bootstrap() {
            Ok(query_id) => {
                info!(query_id = ?query_id, dialed, "Kademlia bootstrap query initiated");
            }
            Err(e) => {
                warn!(error = ?e, "Kademlia bootstrap failed - no known peers in routing table");
            }
        }
    }

    /// Re-dial bootstrap peers that are neither connected nor being dialed
    pub(crate) fn retry_bootstrap_peers(&mut self) {
        self.dial_bootstrap_peers();
    }

    fn dial_bootstrap_peers(&mut self) -> usize {
        let peers = self.bootstrap_peers.clone();
        peers
            .into_iter()
            .filter(|(peer_id, addr)| self.dial_if_allowed(*peer_id, Some(addr.clone()), "bootstrap"))
            .count()
    }
}
