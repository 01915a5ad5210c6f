//! Command handler - processes NetworkCommands from the API layer

use super::super::commands::NetworkCommand;
use super::NetworkEventLoop;
use crate::modules::gossip::GossipError;
use crate::modules::query::QueryFrame;
use libp2p::gossipsub::{self, IdentTopic};
use tracing::{debug, info, warn};

impl NetworkEventLoop {
    /// Returns true when the loop should exit
    pub(crate) async fn handle_command(&mut self, command: NetworkCommand) -> bool {
        match command {
            NetworkCommand::Shutdown => {
                info!("Received shutdown command");
                return true;
            }

            NetworkCommand::Subscribe { topic, response } => {
                let ident_topic = IdentTopic::new(&topic);
                let result = match self.swarm.behaviour_mut().subscribe(&ident_topic) {
                    Ok(true) => Ok(()),
                    Ok(false) => Err("GossipSub is disabled".to_string()),
                    Err(e) => Err(format!("Subscription failed: {:?}", e)),
                };
                let _ = response.send(result);
            }

            NetworkCommand::Publish {
                topic,
                data,
                response,
            } => {
                let _ = response.send(self.publish(topic, data));
            }

            NetworkCommand::IsConnected { peer_id, response } => {
                let _ = response.send(self.swarm.is_connected(&peer_id));
            }

            NetworkCommand::SendQuery {
                peer_id,
                request,
                response,
            } => {
                let query_id = request.query_id.clone();
                let request_id = self
                    .swarm
                    .behaviour_mut()
                    .query
                    .send_request(&peer_id, QueryFrame::Request(request));
                debug!(
                    peer = %peer_id,
                    query_id = %query_id,
                    request_id = ?request_id,
                    "Query request queued"
                );
                self.pending_queries.insert(request_id, response);
            }

            NetworkCommand::DialPeer { address, response } => {
                match self.swarm.dial(address.clone()) {
                    Ok(_) => {
                        info!("Dialing peer at {}", address);
                        let _ = response.send(Ok(()));
                    }
                    Err(e) => {
                        warn!("Failed to dial peer at {}: {:?}", address, e);
                        let _ = response.send(Err(format!("Dial failed: {}", e)));
                    }
                }
            }

            NetworkCommand::GetConnectedPeers(response) => {
                let peers = self.swarm.connected_peers().copied().collect();
                let _ = response.send(peers);
            }

            NetworkCommand::GetListenAddrs(response) => {
                let addrs = self.swarm.listeners().cloned().collect();
                let _ = response.send(addrs);
            }
        }

        false
    }

    fn publish(&mut self, topic: String, data: Vec<u8>) -> Result<(), GossipError> {
        let ident_topic = IdentTopic::new(&topic);

        if !self.swarm.behaviour().is_subscribed(&ident_topic) {
            return Err(GossipError::NotJoined {
                message: format!("topic {topic} has not been joined"),
            });
        }

        match self.swarm.behaviour_mut().publish(ident_topic, data) {
            Ok(message_id) => {
                debug!(topic = %topic, message_id = %message_id, "Message published");
                Ok(())
            }
            Err(gossipsub::PublishError::NoPeersSubscribedToTopic) => {
                Err(GossipError::NoPeers { topic })
            }
            Err(e) => {
                warn!(topic = %topic, error = ?e, "Publish failed");
                Err(GossipError::Channel {
                    message: e.to_string(),
                })
            }
        }
    }
}
