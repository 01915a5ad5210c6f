//! Rendezvous discovery - provider announcement and lookup on a shared DHT key

use super::NetworkEventLoop;
use libp2p::PeerId;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often the rendezvous provider record is re-announced
const REANNOUNCE_INTERVAL: Duration = Duration::from_secs(5 * 60);

impl NetworkEventLoop {
    /// Announce ourselves under the rendezvous key when due, then look up
    /// everyone else who did.
    pub(crate) fn run_discovery_round(&mut self) {
        let known_peers = self.swarm.behaviour_mut().known_peer_count();
        if known_peers == 0 {
            debug!("Routing table empty, skipping rendezvous discovery");
            return;
        }

        if self
            .last_announce
            .is_none_or(|last| last.elapsed() >= REANNOUNCE_INTERVAL)
        {
            self.announce_rendezvous();
        }

        let query_id = self
            .swarm
            .behaviour_mut()
            .get_providers(self.rendezvous.clone());
        debug!(?query_id, known_peers, "Rendezvous provider lookup started");
    }

    fn announce_rendezvous(&mut self) {
        match self
            .swarm
            .behaviour_mut()
            .start_providing(self.rendezvous.clone())
        {
            Ok(query_id) => {
                info!(?query_id, "Announcing rendezvous provider record");
                self.last_announce = Some(Instant::now());
            }
            Err(e) => {
                warn!(error = ?e, "Failed to announce rendezvous provider record");
            }
        }
    }

    /// Dial every provider we are not already connected to
    pub(crate) fn handle_rendezvous_providers(&mut self, providers: HashSet<PeerId>) {
        let dialed = providers
            .into_iter()
            .filter(|peer_id| self.dial_if_allowed(*peer_id, None, "rendezvous"))
            .count();

        if dialed > 0 {
            info!(dialed, "Dialing peers found at rendezvous");
        }
    }
}
