use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use errors::AppError;
use libp2p::identity::Keypair;
use tracing::{info, warn};

/// Decode a base64 protobuf-encoded libp2p private key
///
/// # Errors
/// Returns `AppError::Crypto` if the base64 or the key encoding is invalid
pub fn decode_keypair(encoded: &str) -> Result<Keypair, AppError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::Crypto(format!("Invalid base64 private key: {}", e)))?;

    Keypair::from_protobuf_encoding(&bytes)
        .map_err(|e| AppError::Crypto(format!("Failed to decode private key: {}", e)))
}

/// Inverse of [`decode_keypair`]
pub fn encode_keypair(keypair: &Keypair) -> Result<String, AppError> {
    let bytes = keypair
        .to_protobuf_encoding()
        .map_err(|e| AppError::Crypto(format!("Failed to encode private key: {}", e)))?;
    Ok(STANDARD.encode(bytes))
}

/// Use the configured key, or generate a fresh Ed25519 identity
pub fn load_or_generate(encoded: Option<&str>) -> Result<Keypair, AppError> {
    if let Some(encoded) = encoded {
        let keypair = decode_keypair(encoded)?;
        info!(peer_id = %keypair.public().to_peer_id(), "Loaded node identity");
        return Ok(keypair);
    }

    let keypair = Keypair::generate_ed25519();
    let encoded = encode_keypair(&keypair)?;
    warn!(
        peer_id = %keypair.public().to_peer_id(),
        "No NODE_PRIVATE_KEY configured, generated a new identity"
    );
    info!("Set NODE_PRIVATE_KEY={} to keep this identity", encoded);

    Ok(keypair)
}
