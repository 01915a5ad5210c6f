//! Kademlia event handler - routing table, bootstrap and rendezvous queries

use super::NetworkEventLoop;
use libp2p::kad::{self, GetProvidersOk, QueryResult};
use tracing::{debug, info, warn};

impl NetworkEventLoop {
    pub(crate) fn handle_kad_event(&mut self, event: kad::Event) {
        match event {
            kad::Event::RoutingUpdated {
                peer, addresses, ..
            } => {
                debug!(
                    source = "dht",
                    %peer,
                    address_count = addresses.len(),
                    "Routing table updated"
                );
            }

            kad::Event::OutboundQueryProgressed { id, result, .. } => match result {
                QueryResult::Bootstrap(Ok(ok)) => {
                    debug!(
                        query_id = ?id,
                        peer = %ok.peer,
                        remaining = ok.num_remaining,
                        "Kademlia bootstrap progressed"
                    );
                    if ok.num_remaining == 0 {
                        info!("Kademlia bootstrap complete");
                    }
                }

                QueryResult::Bootstrap(Err(e)) => {
                    warn!(query_id = ?id, error = ?e, "Kademlia bootstrap failed");
                }

                QueryResult::StartProviding(Ok(_)) => {
                    debug!(query_id = ?id, "Rendezvous provider record stored");
                }

                QueryResult::StartProviding(Err(e)) => {
                    debug!(query_id = ?id, error = ?e, "Rendezvous announcement incomplete");
                }

                QueryResult::GetProviders(Ok(GetProvidersOk::FoundProviders { key, providers })) => {
                    if key == self.rendezvous {
                        debug!(
                            query_id = ?id,
                            provider_count = providers.len(),
                            "Rendezvous providers found"
                        );
                        self.handle_rendezvous_providers(providers);
                    }
                }

                QueryResult::GetProviders(Ok(GetProvidersOk::FinishedWithNoAdditionalRecord {
                    ..
                })) => {
                    debug!(query_id = ?id, "Rendezvous lookup finished");
                }

                QueryResult::GetProviders(Err(e)) => {
                    debug!(query_id = ?id, error = ?e, "Rendezvous lookup failed");
                }

                other => {
                    debug!(query_id = ?id, result = ?other, "Kademlia query progressed");
                }
            },

            event => {
                debug!(?event, "Unhandled Kademlia event");
            }
        }
    }
}
