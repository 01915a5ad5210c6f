//! Internal command types for NetworkManager to NetworkEventLoop communication

use crate::modules::gossip::GossipError;
use crate::modules::query::{QueryError, QueryRequest};
use libp2p::{Multiaddr, PeerId};
use serde_json::Value;
use tokio::sync::oneshot;

/// Commands sent to the NetworkManager event loop
pub(crate) enum NetworkCommand {
    /// Gracefully shutdown the network
    Shutdown,

    /// Join a GossipSub topic
    Subscribe {
        topic: String,
        response: oneshot::Sender<Result<(), String>>,
    },

    /// Publish bytes to a joined topic
    Publish {
        topic: String,
        data: Vec<u8>,
        response: oneshot::Sender<Result<(), GossipError>>,
    },

    /// Whether a live connection to the peer exists
    IsConnected {
        peer_id: PeerId,
        response: oneshot::Sender<bool>,
    },

    /// Open a query stream to a connected peer
    SendQuery {
        peer_id: PeerId,
        request: QueryRequest,
        response: oneshot::Sender<Result<Value, QueryError>>,
    },

    /// Dial a peer at a specific address
    DialPeer {
        address: Multiaddr,
        response: oneshot::Sender<Result<(), String>>,
    },

    GetConnectedPeers(oneshot::Sender<Vec<PeerId>>),

    GetListenAddrs(oneshot::Sender<Vec<Multiaddr>>),
}
