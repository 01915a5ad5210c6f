use crate::bootstrap::config::Config;
use crate::modules::network::keypair;
use errors::AppError;
use libp2p::identity::Keypair;
use tracing::info;

/// Resolve the node identity from `NODE_PRIVATE_KEY`, or generate one.
pub fn initialize(config: &Config) -> Result<Keypair, AppError> {
    info!("Initializing node identity");

    let keypair = keypair::load_or_generate(config.node_private_key.as_deref())?;
    info!(peer_id = %keypair.public().to_peer_id(), "Node identity ready");

    Ok(keypair)
}
